//! The HTTP server, handler and routes.
//!
//! This file itself contains fairly little business logic and just sets up the
//! `hyper` server and catches errors. The main logic is in `handlers.rs`.

use futures::FutureExt;
use hyper::service::service_fn;
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto,
};
use std::{
    convert::Infallible,
    future::Future,
    net::{IpAddr, SocketAddr},
    panic::AssertUnwindSafe,
    sync::Arc,
};
use tokio::net::TcpListener;

use crate::{api, prelude::*, store::StoreProvider};
use self::{handlers::handle, response::internal_server_error};


mod handlers;
mod log;
mod response;


/// HTTP server configuration.
#[derive(Debug, Clone, confique::Config)]
pub(crate) struct HttpConfig {
    /// The TCP port the HTTP server should listen on.
    #[config(default = 3080)]
    pub(crate) port: u16,

    /// The bind address to listen on.
    #[config(default = "127.0.0.1")]
    pub(crate) address: IpAddr,
}


type Body = http_body_util::Full<bytes::Bytes>;
type Response<T = Body> = hyper::Response<T>;
type Request<T = hyper::body::Incoming> = hyper::Request<T>;


/// Context that the request handler has access to.
struct Context {
    api_root: api::RootNode,
    store: StoreProvider,
    log_http_headers: bool,
}


/// Starts the HTTP server and runs it until ctrl+c is received.
pub(crate) async fn serve(
    config: &HttpConfig,
    log_http_headers: bool,
    api_root: api::RootNode,
    store: StoreProvider,
) -> Result<()> {
    let ctx = Arc::new(Context { api_root, store, log_http_headers });

    let addr = SocketAddr::new(config.address, config.port);
    let listener = TcpListener::bind(addr).await
        .with_context(|| format!("failed to bind to {addr}"))?;
    info!("Listening on http://{}", listener.local_addr()?);

    loop {
        let stream = tokio::select! {
            res = listener.accept() => match res {
                Ok((stream, _)) => stream,
                Err(e) => {
                    warn!("Failed to accept TCP connection: {e}");
                    continue;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Received ctrl+c, shutting down HTTP server");
                return Ok(());
            }
        };

        // Each connection is served on its own task, `handle` is called for
        // each request on that connection.
        let ctx = Arc::clone(&ctx);
        tokio::spawn(async move {
            let service = service_fn(move |req| {
                handle_internal_errors(handle(req, Arc::clone(&ctx)))
            });
            let res = auto::Builder::new(TokioExecutor::new())
                .serve_connection(TokioIo::new(stream), service)
                .await;
            if let Err(e) = res {
                debug!("Error while serving HTTP connection: {e}");
            }
        });
    }
}

/// Wraps another future and catches all panics that might occur when
/// resolving/polling that given future. This ensures that we always answer with
/// `500` instead of just crashing the thread and closing the connection.
async fn handle_internal_errors(
    future: impl Future<Output = Response>,
) -> Result<Response, Infallible> {
    // Asserting unwind safety: a panicking request leaves no shared state
    // behind that other requests could observe broken.
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(response) => Ok(response),
        Err(panic) => {
            // For most panics (which use `panic!` like `println!`), the payload
            // is either `&str` or `String`.
            let msg = panic.downcast_ref::<String>()
                .map(|s| s.as_str())
                .or(panic.downcast_ref::<&str>().copied());

            match msg {
                Some(msg) => error!("INTERNAL SERVER ERROR: HTTP handler panicked: '{}'", msg),
                None => error!("INTERNAL SERVER ERROR: HTTP handler panicked"),
            }

            Ok(internal_server_error())
        }
    }
}
