//! Telemetry error types.

use thiserror::Error;

/// Errors raised while installing logging or metrics.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The Prometheus recorder or its listener could not be installed.
    #[error("cannot install metrics exporter: {0}")]
    MetricsInit(String),

    /// The subscriber could not be installed, or the filter is malformed.
    #[error("cannot install log subscriber: {0}")]
    LoggingInit(String),

    /// The metrics listen address does not parse.
    #[error("bad listen address {0}")]
    InvalidAddress(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TelemetryError::MetricsInit("recorder already set".to_string());
        assert_eq!(
            err.to_string(),
            "cannot install metrics exporter: recorder already set"
        );

        let err = TelemetryError::InvalidAddress("nowhere".to_string());
        assert_eq!(err.to_string(), "bad listen address nowhere");
    }
}
