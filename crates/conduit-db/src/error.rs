//! Database error types.

use thiserror::Error;

/// Result type alias using [`DbError`].
pub type DbResult<T> = Result<T, DbError>;

/// Message of the error returned once every attempt hit a conflict.
pub const MAX_RETRIES_EXCEEDED: &str = "Max retries exceeded";

/// Message of the error returned when the caller cancelled the retry loop.
pub const INTERRUPTED: &str = "Thread interrupted";

/// Errors raised by transactional work.
#[derive(Debug, Error)]
pub enum DbError {
    /// The driver reported a failure with a SQLSTATE-style code.
    #[error("driver error {code}: {message}")]
    Driver {
        /// Driver error code, e.g. `40001`.
        code: String,
        /// Driver message.
        message: String,
    },

    /// The retry loop gave up.
    #[error("transaction retry failed: {0}")]
    RetryFailed(String),

    /// Any other failure inside a unit of work.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DbError {
    /// Create a driver error.
    pub fn driver(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Driver {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a retry failure.
    pub fn retry_failed(message: impl Into<String>) -> Self {
        Self::RetryFailed(message.into())
    }

    /// The driver code, if this is a driver error.
    #[must_use]
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::Driver { code, .. } => Some(code),
            Self::RetryFailed(_) | Self::Other(_) => None,
        }
    }

    /// Returns `true` if the retry loop gave up.
    #[must_use]
    pub const fn is_retry_failed(&self) -> bool {
        matches!(self, Self::RetryFailed(_))
    }
}
