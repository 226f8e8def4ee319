//! Combined logging and metrics settings.

use crate::logging::LogConfig;
use crate::metrics::MetricsConfig;

/// Settings for [`init_telemetry`](crate::init_telemetry).
///
/// The service name is mirrored into the logging settings so every log
/// record carries it.
///
/// ```rust
/// use conduit_telemetry::{LogConfig, TelemetryConfig};
///
/// let config = TelemetryConfig::new("shop")
///     .with_logging(LogConfig::development())
///     .with_metrics_on("127.0.0.1:9100");
///
/// assert_eq!(config.logging.service_name, "shop");
/// assert!(config.metrics.enabled);
/// ```
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Name attached to every log record.
    pub service_name: String,

    /// Log subscriber settings.
    pub logging: LogConfig,

    /// Prometheus exporter settings.
    pub metrics: MetricsConfig,
}

impl TelemetryConfig {
    /// Production logging and no metrics, under `service_name`.
    pub fn new(service_name: impl Into<String>) -> Self {
        let service_name = service_name.into();
        Self {
            logging: LogConfig::production().with_service_name(service_name.clone()),
            metrics: MetricsConfig::default(),
            service_name,
        }
    }

    /// Replaces the logging settings, keeping this service name.
    #[must_use]
    pub fn with_logging(mut self, logging: LogConfig) -> Self {
        self.logging = logging.with_service_name(self.service_name.clone());
        self
    }

    /// Replaces the metrics settings.
    #[must_use]
    pub fn with_metrics(mut self, metrics: MetricsConfig) -> Self {
        self.metrics = metrics;
        self
    }

    /// Turns the exporter on at `addr`.
    #[must_use]
    pub fn with_metrics_on(mut self, addr: impl Into<String>) -> Self {
        self.metrics.enabled = true;
        self.metrics.addr = addr.into();
        self
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self::new("conduit")
    }
}
