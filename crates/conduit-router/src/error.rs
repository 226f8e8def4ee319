//! Route registration errors.

use thiserror::Error;

use crate::method::HttpMethod;

/// Result type for route table operations.
pub type RouteResult<T> = Result<T, RouteError>;

/// Errors raised while registering routes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// A prefix route's path does not end with the separator.
    #[error("bad path format: {path} (prefix routes must end with '/')")]
    BadPathFormat {
        /// The offending path.
        path: String,
    },

    /// A route with the same key is already registered.
    #[error("route already registered: {method} {path}")]
    AlreadyRegistered {
        /// Method of the conflicting route.
        method: HttpMethod,
        /// Path of the conflicting route.
        path: String,
    },

    /// The route uses a method that cannot carry routes.
    #[error("cannot register route with unsupported method: {path}")]
    UnsupportedMethod {
        /// Path of the rejected route.
        path: String,
    },
}

impl RouteError {
    /// Create a bad path format error.
    pub fn bad_path_format(path: impl Into<String>) -> Self {
        Self::BadPathFormat { path: path.into() }
    }

    /// Create an already registered error.
    pub fn already_registered(method: HttpMethod, path: impl Into<String>) -> Self {
        Self::AlreadyRegistered {
            method,
            path: path.into(),
        }
    }

    /// Create an unsupported method error.
    pub fn unsupported_method(path: impl Into<String>) -> Self {
        Self::UnsupportedMethod { path: path.into() }
    }
}
