//! Structured logging for Conduit.
//!
//! Installs a `tracing-subscriber` registry with an [`EnvFilter`] and either
//! a JSON layer (production) or a pretty layer (development).
//!
//! Access log lines are emitted on the [`ACCESS_TARGET`] target, so they can
//! be routed or silenced separately, e.g. `info,conduit::access=off`.
//!
//! # Example
//!
//! ```rust,ignore
//! use conduit_telemetry::logging::{LogConfig, init_logging};
//!
//! init_logging(&LogConfig::development())?;
//!
//! tracing::info!(route = "/users", "registered route");
//! ```

use serde::{Deserialize, Serialize};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Target used for per-request access log records.
pub const ACCESS_TARGET: &str = "conduit::access";

/// Output format of the log layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Multi-line human-readable output.
    Pretty,
}

/// Settings for [`init_logging`].
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Install a subscriber at all.
    pub enabled: bool,
    /// `EnvFilter` directive, e.g. `info` or `conduit_db=debug,info`.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
    /// Log span creation and close.
    pub span_events: bool,
    /// Include source file and line.
    pub file_line_info: bool,
    /// Include thread ids.
    pub thread_ids: bool,
    /// Include the event target.
    pub include_target: bool,
    /// Logged once at start-up as `service.name`.
    pub service_name: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl LogConfig {
    /// JSON lines at `info`, without source locations.
    #[must_use]
    pub fn production() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            format: LogFormat::Json,
            span_events: false,
            file_line_info: false,
            thread_ids: false,
            include_target: true,
            service_name: "conduit".to_string(),
        }
    }

    /// Pretty output at `debug`, with span events and source locations.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            format: LogFormat::Pretty,
            span_events: true,
            file_line_info: true,
            ..Self::production()
        }
    }

    /// Sets the filter directive.
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Sets the output format.
    #[must_use]
    pub const fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets the service name.
    #[must_use]
    pub fn with_service_name(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = service_name.into();
        self
    }
}

/// Installs the global subscriber.
///
/// Disabled logging is a no-op. Fails if the filter is invalid or a global
/// subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;

    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let base = tracing_subscriber::fmt::layer()
        .with_span_events(span_events)
        .with_file(config.file_line_info)
        .with_line_number(config.file_line_info)
        .with_thread_ids(config.thread_ids)
        .with_target(config.include_target);
    let layer = match config.format {
        LogFormat::Json => base.json().boxed(),
        LogFormat::Pretty => base.pretty().boxed(),
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    tracing::info!(service.name = %config.service_name, "logging initialized");
    Ok(())
}

/// Parses a filter directive such as `info,conduit_db=debug`.
pub fn create_env_filter(directive: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(directive)
        .map_err(|e| TelemetryError::LoggingInit(format!("bad filter {directive:?}: {e}")))
}

/// Field names shared by log records across the workspace.
pub mod fields {
    /// Per-request identifier.
    pub const REQUEST_ID: &str = "request_id";
    /// Request method.
    pub const HTTP_METHOD: &str = "http.method";
    /// Response status.
    pub const HTTP_STATUS: &str = "http.status_code";
    /// Registered path of the matched route.
    pub const ROUTE: &str = "route";
    /// Display name of the owning site module.
    pub const MODULE: &str = "module";
    /// Async task id.
    pub const TASK_ID: &str = "task_id";
    /// Transaction attempt, counting from one.
    pub const ATTEMPT: &str = "attempt";
    /// Transaction isolation level.
    pub const ISOLATION: &str = "isolation";
    /// Error description.
    pub const ERROR: &str = "error";
    /// Service name.
    pub const SERVICE_NAME: &str = "service.name";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_production() {
        let config = LogConfig::default();
        assert!(config.enabled);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, "info");
    }

    #[test]
    fn test_development_config() {
        let config = LogConfig::development();
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.span_events);
        assert!(config.file_line_info);
        assert_eq!(config.level, "debug");
    }

    #[test]
    fn test_builders() {
        let config = LogConfig::production()
            .with_level("warn")
            .with_format(LogFormat::Pretty)
            .with_service_name("shop");
        assert_eq!(config.level, "warn");
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.service_name, "shop");
    }

    #[test]
    fn test_create_env_filter() {
        assert!(create_env_filter("info,conduit::access=off").is_ok());
    }

    #[test]
    fn test_disabled_logging() {
        let config = LogConfig {
            enabled: false,
            ..LogConfig::default()
        };
        assert!(init_logging(&config).is_ok());
    }

    #[test]
    fn test_field_names() {
        assert_eq!(fields::TASK_ID, "task_id");
        assert_eq!(fields::HTTP_METHOD, "http.method");
        assert_eq!(ACCESS_TARGET, "conduit::access");
    }
}
