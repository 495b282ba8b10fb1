use bytes::Bytes;
use hyper::{header, StatusCode};

use super::{Body, Response};


/// A response with the given status and a plain text body.
pub(super) fn plain(status: StatusCode, body: impl Into<Bytes>) -> Response {
    with_type(status, "text/plain; charset=UTF-8", body)
}

pub(super) fn with_type(
    status: StatusCode,
    content_type: &'static str,
    body: impl Into<Bytes>,
) -> Response {
    let mut response = Response::new(Body::new(body.into()));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static(content_type),
    );
    response
}

pub(super) fn not_found() -> Response {
    plain(StatusCode::NOT_FOUND, "404 Not found")
}

pub(super) fn method_not_allowed() -> Response {
    plain(StatusCode::METHOD_NOT_ALLOWED, "405 Method not allowed")
}

pub(super) fn bad_request(msg: impl Into<String>) -> Response {
    plain(StatusCode::BAD_REQUEST, msg.into())
}

pub(super) fn internal_server_error() -> Response {
    plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}
