use http_body_util::{BodyExt, Limited};
use hyper::{Method, StatusCode};
use juniper::http::{graphiql::graphiql_source, GraphQLBatchRequest};
use std::{sync::Arc, time::Instant};

use crate::{api, prelude::*};
use super::{Context, Request, Response, log, response};


/// Requests to `/graphql` with a larger body are rejected.
const MAX_API_BODY_SIZE: usize = 1024 * 1024;

/// This is the main HTTP entry point, called for each incoming request.
pub(super) async fn handle(req: Request, ctx: Arc<Context>) -> Response {
    log::req::log(&req);
    if ctx.log_http_headers {
        log::headers::log(&req);
    }

    let method = req.method().clone();
    let path = req.uri().path().trim_end_matches('/').to_owned();

    match path.as_str() {
        "/graphql" if method == Method::POST => handle_api(req, &ctx).await,

        // The interactive GraphQL IDE.
        "/graphiql" if method == Method::GET => {
            let html = graphiql_source("/graphql", None);
            response::with_type(StatusCode::OK, "text/html; charset=UTF-8", html)
        }

        _ if method != Method::GET && method != Method::POST => response::method_not_allowed(),
        "/graphql" | "/graphiql" => response::method_not_allowed(),

        _ => {
            debug!("Responding with 404 to {:?} '{}'", method, path);
            response::not_found()
        }
    }
}

/// Handles a request to `/graphql`.
async fn handle_api(req: Request, ctx: &Context) -> Response {
    match Limited::new(req.into_body(), MAX_API_BODY_SIZE).collect().await {
        Ok(collected) => handle_api_body(&collected.to_bytes(), ctx).await,
        Err(e) => {
            debug!("Could not read body of API request: {e}");
            response::bad_request("could not read request body")
        }
    }
}

/// Executes the single or batch GraphQL request in `body`.
async fn handle_api_body(body: &[u8], ctx: &Context) -> Response {
    let before = Instant::now();

    let request = match serde_json::from_slice::<GraphQLBatchRequest>(body) {
        Ok(request) => request,
        Err(e) => return response::bad_request(format!("invalid GraphQL request: {e}")),
    };

    // Every request gets its own store handle.
    let store = ctx.store.for_request();
    let api_context = api::Context::new(store.clone());
    let out = request.execute(&ctx.api_root, &api_context).await;

    let status = if out.is_ok() { StatusCode::OK } else { StatusCode::BAD_REQUEST };
    let response = match serde_json::to_vec(&out) {
        Ok(json) => response::with_type(status, "application/json", json),
        Err(e) => {
            error!("Failed to serialize GraphQL response: {e}");
            response::internal_server_error()
        }
    };

    debug!(
        "Finished /graphql query in {:.2?} (with {} store queries)",
        before.elapsed(),
        store.num_queries(),
    );

    response
}
