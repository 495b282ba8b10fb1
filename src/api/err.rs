//! API error handling.
//!
//! We define our own error to use for all resolvers. It has a `From` impl to
//! be created from store errors and a couple of macros to easily create one.
//!
//! The error carries a coarse "kind" and an optional "key" that clients can
//! match on. Both end up in the `extensions` of the GraphQL error.

use juniper::{FieldError, IntoFieldError, ScalarValue, graphql_value};

use crate::{prelude::*, store::StoreError};


pub(crate) type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub(crate) struct ApiError {
    pub(crate) msg: String,
    pub(crate) kind: ApiErrorKind,
    pub(crate) key: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    /// The arguments passed to an endpoint are invalid somehow.
    InvalidInput,

    /// The record the operation needs does not exist.
    NotFound,

    /// A write was only partially carried out.
    PartialFailure,

    /// Some server error out of control of the API user.
    InternalServerError,
}

impl ApiErrorKind {
    fn kind_str(&self) -> &str {
        match self {
            Self::InvalidInput => "INVALID_INPUT",
            Self::NotFound => "NOT_FOUND",
            Self::PartialFailure => "PARTIAL_FAILURE",
            Self::InternalServerError => "INTERNAL_SERVER_ERROR",
        }
    }

    fn message_prefix(&self) -> &str {
        match self {
            Self::InvalidInput => "Invalid input",
            Self::NotFound => "Not found",
            Self::PartialFailure => "Partial failure",
            Self::InternalServerError => "Internal server error",
        }
    }
}

impl<S: ScalarValue> IntoFieldError<S> for ApiError {
    fn into_field_error(self) -> juniper::FieldError<S> {
        let msg = format!("{}: {}", self.kind.message_prefix(), self.msg);
        let ext = if let Some(key) = self.key {
            graphql_value!({
                "kind": (self.kind.kind_str()),
                "key": key,
            })
        } else {
            graphql_value!({
                "kind": (self.kind.kind_str()),
            })
        };

        FieldError::new(msg, ext)
    }
}


// ===== Helper macros to easily create errors ==================================================

/// Creates an `ApiError` with a `format!` like syntax.
macro_rules! api_err {
    ($kind:ident, key = $key:literal, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::api::err::ApiError {
            msg: format!($fmt $(, $arg)*),
            kind: $crate::api::err::ApiErrorKind::$kind,
            key: Some($key.into()),
        }
    };
    ($kind:ident, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::api::err::ApiError {
            msg: format!($fmt $(, $arg)*),
            kind: $crate::api::err::ApiErrorKind::$kind,
            key: None,
        }
    };
}

macro_rules! invalid_input {
    ($($t:tt)+) => { $crate::api::err::api_err!(InvalidInput, $($t)*) };
}

macro_rules! internal_server_error {
    ($($t:tt)+) => { $crate::api::err::api_err!(InternalServerError, $($t)*) };
}

pub(crate) use api_err;
pub(crate) use invalid_input;
pub(crate) use internal_server_error;


impl From<StoreError> for ApiError {
    fn from(src: StoreError) -> Self {
        match src {
            StoreError::NotFound { .. } => api_err!(NotFound, key = "record.not-found", "{}", src),
            StoreError::Validation(msg) => invalid_input!("{}", msg),
            StoreError::PartialFailure { .. } => {
                api_err!(PartialFailure, key = "record.partial-write", "{}", src)
            }
            StoreError::Backend(e) => {
                // This is the last point where we have the full error at hand.
                error!("Storage error when resolving API request: {e}");
                debug!("Detailed error: {e:?}");

                internal_server_error!("storage backend failed")
            }
        }
    }
}
