//! Errors raised while assembling a [`ConduitConfig`](crate::ConduitConfig).

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used by the loader and validation.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Why a configuration could not be produced.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required file layer does not exist.
    #[error("no config file at {path}")]
    FileNotFound {
        /// Requested path.
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("cannot read config file {path}")]
    ReadError {
        /// Requested path.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A TOML layer is malformed.
    #[error("bad TOML: {0}")]
    TomlError(#[from] toml::de::Error),

    /// A JSON layer is malformed, or the merged document does not match the schema.
    #[error("bad JSON or schema mismatch: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A single field holds a value the server cannot run with.
    #[error("{field}: {reason}")]
    InvalidValue {
        /// Dotted field path, e.g. `tasks.default_ttl_ms`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An override variable is unknown or its value does not parse.
    #[error("env {var}: {reason}")]
    EnvParseError {
        /// Variable name.
        var: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Fields are individually fine but inconsistent with each other.
    #[error("inconsistent config: {0}")]
    ValidationError(String),
}

impl ConfigError {
    /// [`ConfigError::FileNotFound`] for `path`.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// [`ConfigError::ReadError`] wrapping `source`.
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    /// [`ConfigError::InvalidValue`] for a dotted field path.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// [`ConfigError::EnvParseError`] for an override variable.
    pub fn env_parse_error(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParseError {
            var: var.into(),
            reason: reason.into(),
        }
    }

    /// [`ConfigError::ValidationError`].
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_not_found_error() {
        let err = ConfigError::file_not_found("/etc/conduit/conduit.toml");
        assert!(err.to_string().contains("/etc/conduit/conduit.toml"));
    }

    #[test]
    fn test_invalid_value_error() {
        let err = ConfigError::invalid_value("transactions.max_retries", "must be at least 1");
        assert_eq!(
            err.to_string(),
            "transactions.max_retries: must be at least 1"
        );
    }

    #[test]
    fn test_env_parse_error() {
        let err = ConfigError::env_parse_error("CONDUIT__TASKS__DEFAULT_TTL_MS", "expected integer");
        assert!(err.to_string().contains("CONDUIT__TASKS__DEFAULT_TTL_MS"));
        assert!(err.to_string().contains("expected integer"));
    }
}
