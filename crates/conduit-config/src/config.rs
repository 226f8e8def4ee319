//! Root configuration type.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::time::Duration;

use conduit_db::{ConflictCodes, RetryPolicy};
use conduit_tasks::AsyncTaskManagerConfig;
use conduit_telemetry::{LogConfig, MetricsConfig, TelemetryConfig};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::schema::{
    LogFormat, LoggingSection, MetricsSection, ServerSection, TasksSection, TransactionsSection,
};

/// Complete Conduit configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to layer files and environment
/// variables over the defaults.
///
/// ```
/// use conduit_config::ConduitConfig;
///
/// let config = ConduitConfig::default();
/// assert_eq!(config.transactions.max_retries, 5);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConduitConfig {
    /// Dispatch settings.
    #[serde(default)]
    pub server: ServerSection,

    /// Async task manager settings.
    #[serde(default)]
    pub tasks: TasksSection,

    /// Transaction retry settings.
    #[serde(default)]
    pub transactions: TransactionsSection,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSection,

    /// Metrics settings.
    #[serde(default)]
    pub metrics: MetricsSection,
}

impl ConduitConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> ConduitConfigBuilder {
        ConduitConfigBuilder::default()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.transactions.max_retries == 0 {
            return Err(ConfigError::invalid_value(
                "transactions.max_retries",
                "must be at least 1",
            ));
        }

        if self.tasks.maintenance_interval_ms == 0 {
            return Err(ConfigError::invalid_value(
                "tasks.maintenance_interval_ms",
                "must be positive",
            ));
        }

        if self.tasks.default_ttl_ms == 0 {
            return Err(ConfigError::invalid_value(
                "tasks.default_ttl_ms",
                "must be positive",
            ));
        }

        if self.tasks.max_concurrent == 0 {
            return Err(ConfigError::invalid_value(
                "tasks.max_concurrent",
                "must be positive",
            ));
        }

        let codes = [
            (
                "transactions.serialization_failure_code",
                &self.transactions.serialization_failure_code,
            ),
            ("transactions.deadlock_code", &self.transactions.deadlock_code),
        ];
        for (field, code) in codes {
            if code.trim().is_empty() {
                return Err(ConfigError::invalid_value(field, "must not be empty"));
            }
        }
        if self.transactions.serialization_failure_code == self.transactions.deadlock_code {
            return Err(ConfigError::validation_error(
                "transactions.serialization_failure_code and transactions.deadlock_code must differ",
            ));
        }

        let mut seen = HashSet::new();
        for name in &self.server.server_names {
            if name.trim().is_empty() {
                return Err(ConfigError::invalid_value(
                    "server.server_names",
                    "host names must not be empty",
                ));
            }
            if !seen.insert(name.to_ascii_lowercase()) {
                return Err(ConfigError::invalid_value(
                    "server.server_names",
                    format!("duplicate host name: {name}"),
                ));
            }
        }

        if self.metrics.enabled && self.metrics.addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "metrics.addr",
                format!("invalid socket address: {}", self.metrics.addr),
            ));
        }

        Ok(())
    }

    /// Development preset: debug level, pretty logs, no metrics.
    #[must_use]
    pub fn development() -> Self {
        Self {
            logging: LoggingSection {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
                ..LoggingSection::default()
            },
            ..Self::default()
        }
    }

    /// Production preset: info level, JSON logs, metrics exported.
    #[must_use]
    pub fn production() -> Self {
        Self {
            logging: LoggingSection {
                level: "info".to_string(),
                format: LogFormat::Json,
                ..LoggingSection::default()
            },
            metrics: MetricsSection {
                enabled: true,
                ..MetricsSection::default()
            },
            ..Self::default()
        }
    }

    /// Logging configuration for [`conduit_telemetry::init_logging`].
    pub fn log_config(&self) -> LogConfig {
        let base = match self.logging.format {
            LogFormat::Pretty => LogConfig::development(),
            LogFormat::Json => LogConfig::production(),
        };
        LogConfig {
            enabled: self.logging.enabled,
            ..base
                .with_level(self.logging.level.clone())
                .with_service_name(self.logging.service_name.clone())
        }
    }

    /// Metrics configuration for [`conduit_telemetry::init_metrics`].
    pub fn metrics_config(&self) -> MetricsConfig {
        MetricsConfig {
            enabled: self.metrics.enabled,
            addr: self.metrics.addr.clone(),
            ..MetricsConfig::default()
        }
    }

    /// Combined configuration for [`conduit_telemetry::init_telemetry`].
    pub fn telemetry_config(&self) -> TelemetryConfig {
        TelemetryConfig {
            service_name: self.logging.service_name.clone(),
            logging: self.log_config(),
            metrics: self.metrics_config(),
        }
    }

    /// Retry policy for the transaction executor.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_retries(self.transactions.max_retries)
            .with_initial_backoff(Duration::from_millis(self.transactions.initial_backoff_ms))
            .with_conflict_codes(ConflictCodes::new(
                self.transactions.serialization_failure_code.clone(),
                self.transactions.deadlock_code.clone(),
            ))
    }

    /// Configuration for the async task manager.
    pub fn task_manager_config(&self) -> AsyncTaskManagerConfig {
        AsyncTaskManagerConfig::default()
            .with_maintenance_interval(Duration::from_millis(self.tasks.maintenance_interval_ms))
            .with_default_ttl(Duration::from_millis(self.tasks.default_ttl_ms))
            .with_max_concurrent(self.tasks.max_concurrent)
    }
}

/// Builder for [`ConduitConfig`].
#[derive(Debug, Default)]
pub struct ConduitConfigBuilder {
    config: ConduitConfig,
}

impl ConduitConfigBuilder {
    /// Set the server section.
    #[must_use]
    pub fn server(mut self, server: ServerSection) -> Self {
        self.config.server = server;
        self
    }

    /// Set the tasks section.
    #[must_use]
    pub fn tasks(mut self, tasks: TasksSection) -> Self {
        self.config.tasks = tasks;
        self
    }

    /// Set the transactions section.
    #[must_use]
    pub fn transactions(mut self, transactions: TransactionsSection) -> Self {
        self.config.transactions = transactions;
        self
    }

    /// Set the logging section.
    #[must_use]
    pub fn logging(mut self, logging: LoggingSection) -> Self {
        self.config.logging = logging;
        self
    }

    /// Set the metrics section.
    #[must_use]
    pub fn metrics(mut self, metrics: MetricsSection) -> Self {
        self.config.metrics = metrics;
        self
    }

    /// Build without validation.
    #[must_use]
    pub fn build(self) -> ConduitConfig {
        self.config
    }

    /// Build and validate.
    pub fn build_validated(self) -> ConfigResult<ConduitConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
