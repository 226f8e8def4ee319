//! Typed configuration for Conduit.
//!
//! - TOML and JSON configuration files
//! - Environment variable overrides (`PREFIX__SECTION__KEY`)
//! - Strict parsing: unknown sections and keys are errors
//! - Layering: defaults or preset, then files, then environment
//!
//! # Example
//!
//! ```no_run
//! use conduit_config::ConfigLoader;
//!
//! # fn main() -> Result<(), conduit_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_file("conduit.toml")?
//!     .with_env_prefix("CONDUIT")
//!     .load()?;
//!
//! let policy = config.retry_policy();
//! let tasks = config.task_manager_config();
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! server_names = ["example.com"]
//!
//! [tasks]
//! maintenance_interval_ms = 60000
//! default_ttl_ms = 300000
//! max_concurrent = 1000
//!
//! [transactions]
//! max_retries = 5
//! initial_backoff_ms = 100
//! serialization_failure_code = "40001"
//! deadlock_code = "40P01"
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! service_name = "conduit"
//!
//! [metrics]
//! enabled = false
//! addr = "0.0.0.0:9090"
//! ```

mod config;
mod error;
mod loader;
mod schema;

pub use config::{ConduitConfig, ConduitConfigBuilder};
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use schema::{
    LogFormat, LoggingSection, MetricsSection, ServerSection, TasksSection, TransactionsSection,
};
