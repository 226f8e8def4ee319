//! Observability for Conduit.
//!
//! - **Logging**: structured JSON or pretty output via `tracing-subscriber`
//! - **Metrics**: Prometheus-format metrics via the `metrics` crate
//!
//! # Example
//!
//! ```rust,ignore
//! use conduit_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::new("shop").with_metrics_on("0.0.0.0:9090");
//!
//! init_telemetry(config)?;
//! ```
//!
//! # Metrics Endpoint
//!
//! ```text
//! # TYPE conduit_requests_total counter
//! conduit_requests_total{method="GET",status="200"} 1234
//! conduit_requests_total{method="GET",status="404"} 56
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig, LogFormat, ACCESS_TARGET};
pub use crate::metrics::{init_metrics, render_metrics, MetricsConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initializes logging, then metrics.
///
/// # Errors
///
/// Returns `TelemetryError` if either subsystem fails to initialize.
pub fn init_telemetry(config: TelemetryConfig) -> TelemetryResult<()> {
    init_logging(&config.logging)?;
    init_metrics(&config.metrics)?;
    Ok(())
}
