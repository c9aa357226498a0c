use thiserror::Error;

use crate::http::request::Method;

/// Misconfigured routes.
///
/// Everything except [`RouteError::HandlerMissing`] is raised while the route
/// table is being built and should abort startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("path parameters are unsorted for {method} {path}")]
    UnsortedPathParameters { method: Method, path: String },

    #[error("empty path parameter name for {method} {path}")]
    EmptyPathParameter { method: Method, path: String },

    #[error("invalid path pattern {path:?}: {reason}")]
    InvalidPathPattern { path: String, reason: &'static str },

    #[error("{method} {path} declares {resolvers} path resolvers but only {placeholders} placeholders")]
    PathParameterMismatch {
        method: Method,
        path: String,
        resolvers: usize,
        placeholders: usize,
    },

    #[error("no mapper registered for content kind {0:?}")]
    UnknownMapper(String),

    #[error("no handler defined for {method} {path}")]
    HandlerMissing { method: Method, path: String },
}

/// A handler argument could not be taken from the request.
///
/// Dispatch turns these into `400 Bad Request` responses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("missing path value at position {0}")]
    MissingPath(usize),

    #[error("missing query parameter {0:?}")]
    MissingQuery(String),

    #[error("missing header {0:?}")]
    MissingHeader(String),

    #[error("unsupported content type {found:?}, expected {expected}")]
    UnsupportedContentType { found: String, expected: String },

    #[error("cannot read {value:?} as {expected}")]
    InvalidValue { value: String, expected: &'static str },

    #[error("unreadable {content_kind} body: {source}")]
    Body {
        content_kind: String,
        #[source]
        source: MapperError,
    },
}

/// Body content could not be mapped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapperError {
    #[error("empty body")]
    Empty,

    #[error("{0}")]
    Decode(String),

    #[error("{0}")]
    Encode(String),
}
