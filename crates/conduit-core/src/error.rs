//! Handler failure taxonomy.
//!
//! The dispatcher classifies every failure a handler returns:
//!
//! | Variant | Status | Log level |
//! |---|---|---|
//! | [`HandlerError::MissingParameter`] | 400 | warn |
//! | [`HandlerError::InvalidParameterValue`] | 400 | warn |
//! | [`HandlerError::Internal`] | 500 | error |

use http::StatusCode;
use thiserror::Error;

/// Result type alias using [`HandlerError`].
pub type HandlerResult<T> = Result<T, HandlerError>;

/// Failure returned by a request handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A required parameter was absent.
    #[error("missing parameter: {0}")]
    MissingParameter(String),

    /// A parameter was present but could not be used.
    #[error("invalid parameter value: {0}")]
    InvalidParameterValue(String),

    /// Any other failure.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl HandlerError {
    /// Create a missing parameter error.
    pub fn missing_parameter(name: impl Into<String>) -> Self {
        Self::MissingParameter(name.into())
    }

    /// Create an invalid parameter value error.
    pub fn invalid_parameter_value(name: impl Into<String>) -> Self {
        Self::InvalidParameterValue(name.into())
    }

    /// Create an internal error from a message.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(anyhow::Error::msg(message.into()))
    }

    /// Returns `true` for the parameter errors that map to 400.
    #[must_use]
    pub const fn is_bad_request(&self) -> bool {
        matches!(
            self,
            Self::MissingParameter(_) | Self::InvalidParameterValue(_)
        )
    }

    /// Name of the offending parameter, if this is a parameter error.
    #[must_use]
    pub fn parameter_name(&self) -> Option<&str> {
        match self {
            Self::MissingParameter(name) | Self::InvalidParameterValue(name) => Some(name),
            Self::Internal(_) => None,
        }
    }

    /// The status the dispatcher answers with.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        if self.is_bad_request() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<std::io::Error> for HandlerError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.into())
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_errors_are_bad_requests() {
        let err = HandlerError::missing_parameter("id");
        assert!(err.is_bad_request());
        assert_eq!(err.parameter_name(), Some("id"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = HandlerError::invalid_parameter_value("page");
        assert_eq!(err.to_string(), "invalid parameter value: page");
    }

    #[test]
    fn test_internal_error() {
        let err = HandlerError::internal("boom");
        assert!(!err.is_bad_request());
        assert_eq!(err.parameter_name(), None);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_from_anyhow() {
        fn fails() -> HandlerResult<()> {
            let write: Result<(), anyhow::Error> = Err(anyhow::anyhow!("disk full"));
            write?;
            Ok(())
        }
        assert!(matches!(fails(), Err(HandlerError::Internal(_))));
    }
}
