//! Prometheus metrics for Conduit.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `conduit_requests_total` | Counter | `method`, `status` | Dispatched requests |
//! | `conduit_request_duration_seconds` | Histogram | `method` | Dispatch latency |
//! | `conduit_transaction_retries_total` | Counter | `isolation` | Conflict retries |
//! | `conduit_async_tasks_total` | Counter | `outcome` | Async task lifecycle |
//! | `conduit_async_tasks_expired_total` | Counter | - | Tasks evicted by TTL |
//!
//! Recording functions are no-ops until a recorder is installed.
//!
//! # Example
//!
//! ```rust,ignore
//! use conduit_telemetry::metrics::record_request;
//!
//! record_request("GET", 200, Duration::from_millis(45));
//! ```

use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

use crate::error::TelemetryError;
use crate::TelemetryResult;

const REQUESTS_TOTAL: &str = "conduit_requests_total";
const REQUEST_DURATION: &str = "conduit_request_duration_seconds";
const TRANSACTION_RETRIES: &str = "conduit_transaction_retries_total";
const ASYNC_TASKS: &str = "conduit_async_tasks_total";
const ASYNC_TASKS_EXPIRED: &str = "conduit_async_tasks_expired_total";

/// Global metrics handle for rendering.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether the exporter is installed.
    pub enabled: bool,

    /// Address to expose metrics on (e.g., "0.0.0.0:9090").
    pub addr: String,

    /// Histogram buckets for request duration, in seconds.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: "0.0.0.0:9090".to_string(),
            // 1ms .. 10s
            duration_buckets: vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        }
    }
}

impl MetricsConfig {
    /// Parses the configured listen address.
    pub fn socket_addr(&self) -> TelemetryResult<SocketAddr> {
        self.addr
            .parse()
            .map_err(|e| TelemetryError::InvalidAddress(format!("{}: {e}", self.addr)))
    }
}

/// Installs the Prometheus recorder and its HTTP listener.
///
/// Disabled metrics is a no-op.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidAddress` for an unparsable address and
/// `TelemetryError::MetricsInit` if the recorder cannot be installed.
/// Must be called from within a tokio runtime when enabled.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let addr = config.socket_addr()?;

    let (recorder, exporter) = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(REQUEST_DURATION.to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?
        .with_http_listener(addr)
        .build()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let handle = recorder.handle();
    metrics::set_global_recorder(recorder)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    tokio::spawn(async move {
        if let Err(e) = exporter.await {
            tracing::error!(error = ?e, "metrics listener stopped");
        }
    });

    let _ = METRICS_HANDLE.set(handle);

    register_metric_descriptions();
    tracing::info!(%addr, "metrics exporter listening");

    Ok(())
}

/// Returns the global metrics handle if initialized.
pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Renders metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_counter!(REQUESTS_TOTAL, "Total number of dispatched requests");
    describe_histogram!(REQUEST_DURATION, "Request dispatch duration in seconds");
    describe_counter!(
        TRANSACTION_RETRIES,
        "Transaction attempts rolled back on a conflict and retried"
    );
    describe_counter!(ASYNC_TASKS, "Async tasks by lifecycle outcome");
    describe_counter!(
        ASYNC_TASKS_EXPIRED,
        "Async task records removed by the maintenance sweep"
    );
}

/// Records a dispatched request.
///
/// Updates `conduit_requests_total` and
/// `conduit_request_duration_seconds`.
pub fn record_request(method: &str, status_code: u16, duration: Duration) {
    counter!(
        REQUESTS_TOTAL,
        "method" => method.to_string(),
        "status" => status_code.to_string()
    )
    .increment(1);

    histogram!(REQUEST_DURATION, "method" => method.to_string())
        .record(duration.as_secs_f64());
}

/// Records a transaction attempt that hit a conflict and will be retried.
pub fn record_transaction_retry(isolation: &str) {
    counter!(TRANSACTION_RETRIES, "isolation" => isolation.to_string()).increment(1);
}

/// Records an async task submission.
pub fn record_task_submitted() {
    counter!(ASYNC_TASKS, "outcome" => "submitted").increment(1);
}

/// Records an async task reaching a terminal state.
pub fn record_task_completed(ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    counter!(ASYNC_TASKS, "outcome" => outcome).increment(1);
}

/// Records task records evicted by a maintenance sweep.
pub fn record_tasks_expired(count: usize) {
    if count > 0 {
        counter!(ASYNC_TASKS_EXPIRED).increment(count as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MetricsConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.addr, "0.0.0.0:9090");
        assert_eq!(config.duration_buckets.len(), 12);
        assert!(config.socket_addr().is_ok());
    }

    #[test]
    fn test_invalid_address() {
        let config = MetricsConfig {
            enabled: true,
            addr: "not-an-address".to_string(),
            ..MetricsConfig::default()
        };
        assert!(matches!(
            init_metrics(&config),
            Err(TelemetryError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_disabled_metrics() {
        assert!(init_metrics(&MetricsConfig::default()).is_ok());
    }

    #[test]
    fn test_record_functions_dont_panic() {
        record_request("GET", 200, Duration::from_millis(10));
        record_transaction_retry("SERIALIZABLE");
        record_task_submitted();
        record_task_completed(true);
        record_task_completed(false);
        record_tasks_expired(0);
        record_tasks_expired(3);
    }
}
