//! Configuration sections.

use serde::{Deserialize, Serialize};

pub use conduit_telemetry::LogFormat;

/// Request dispatch settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// Host names the dispatcher answers for. Empty accepts any host.
    #[serde(default)]
    pub server_names: Vec<String>,
}

/// Async task manager settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TasksSection {
    /// Interval between expiry sweeps, in milliseconds.
    #[serde(default = "default_maintenance_interval")]
    pub maintenance_interval_ms: u64,

    /// TTL for tasks submitted without one, in milliseconds.
    #[serde(default = "default_ttl")]
    pub default_ttl_ms: u64,

    /// Maximum number of task bodies running at once.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for TasksSection {
    fn default() -> Self {
        Self {
            maintenance_interval_ms: default_maintenance_interval(),
            default_ttl_ms: default_ttl(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

fn default_maintenance_interval() -> u64 {
    60_000
}

fn default_ttl() -> u64 {
    300_000
}

fn default_max_concurrent() -> usize {
    1000
}

/// Transaction retry settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TransactionsSection {
    /// Attempts before giving up on a conflicting transaction.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff in milliseconds. Attempt `n` waits `n` times this.
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    /// SQLSTATE reported for serialization failures.
    #[serde(default = "default_serialization_failure_code")]
    pub serialization_failure_code: String,

    /// SQLSTATE reported for deadlocks.
    #[serde(default = "default_deadlock_code")]
    pub deadlock_code: String,
}

impl Default for TransactionsSection {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff(),
            serialization_failure_code: default_serialization_failure_code(),
            deadlock_code: default_deadlock_code(),
        }
    }
}

fn default_max_retries() -> u32 {
    5
}

fn default_initial_backoff() -> u64 {
    100
}

fn default_serialization_failure_code() -> String {
    "40001".to_string()
}

fn default_deadlock_code() -> String {
    "40P01".to_string()
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive (trace, debug, info, warn, error, or per-target).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Service name attached to log records.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            service_name: default_service_name(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "conduit".to_string()
}

/// Prometheus exporter settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    /// Install the exporter.
    #[serde(default)]
    pub enabled: bool,

    /// Listen address of the scrape endpoint.
    #[serde(default = "default_metrics_addr")]
    pub addr: String,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: default_metrics_addr(),
        }
    }
}

fn default_metrics_addr() -> String {
    "0.0.0.0:9090".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_defaults() {
        let tasks = TasksSection::default();
        assert_eq!(tasks.maintenance_interval_ms, 60_000);
        assert_eq!(tasks.default_ttl_ms, 300_000);

        let tx = TransactionsSection::default();
        assert_eq!(tx.max_retries, 5);
        assert_eq!(tx.initial_backoff_ms, 100);
        assert_eq!(tx.serialization_failure_code, "40001");
        assert_eq!(tx.deadlock_code, "40P01");

        assert!(!MetricsSection::default().enabled);
        assert!(ServerSection::default().server_names.is_empty());
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let tx: TransactionsSection = toml::from_str("max_retries = 9").unwrap();
        assert_eq!(tx.max_retries, 9);
        assert_eq!(tx.initial_backoff_ms, 100);
    }

    #[test]
    fn test_log_format_names() {
        let logging: LoggingSection = toml::from_str(r#"format = "pretty""#).unwrap();
        assert_eq!(logging.format, LogFormat::Pretty);
        assert!(toml::from_str::<LoggingSection>(r#"format = "xml""#).is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(toml::from_str::<TasksSection>("max_workers = 3").is_err());
    }
}
