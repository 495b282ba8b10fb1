//! Small inline modules, so that individual log messages can be filtered by
//! target with the `log.filters` config.

use hyper::{body::Incoming, Request};
use crate::prelude::*;


pub(super) mod req {
    use super::*;

    pub(in crate::http) fn log(req: &Request<Incoming>) {
        trace!(
            method = ?req.method(),
            path = req.uri().path_and_query().map_or("", |pq| pq.as_str()),
            "Incoming HTTP request",
        );
    }
}

pub(super) mod headers {
    use super::*;

    pub(in crate::http) fn log(req: &Request<Incoming>) {
        if tracing::enabled!(tracing::Level::TRACE) {
            let out = req.headers().iter()
                .map(|(name, value)| {
                    format!("\n  {}: {}", name, String::from_utf8_lossy(value.as_bytes()))
                })
                .collect::<String>();
            trace!("HTTP Headers: {}", out);
        }
    }
}
