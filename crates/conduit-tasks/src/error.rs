//! Task manager errors.

use thiserror::Error;

/// Shorthand for results from this crate.
pub type TaskResult<T> = Result<T, TaskError>;

/// Errors that can occur while submitting tasks or driving maintenance.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The executor refused the task.
    #[error("task rejected: {0}")]
    SpawnFailed(String),

    /// The manager has been shut down.
    #[error("task manager is shut down")]
    ShutDown,

    /// A zero interval or limit was supplied.
    #[error("bad task manager settings: {0}")]
    InvalidConfig(String),

    /// The maintenance scheduler is already running.
    #[error("maintenance scheduler already running")]
    AlreadyRunning,
}

impl TaskError {
    /// [`TaskError::SpawnFailed`] with `reason`.
    pub fn spawn_failed(reason: impl Into<String>) -> Self {
        Self::SpawnFailed(reason.into())
    }

    /// [`TaskError::InvalidConfig`] with `reason`.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    /// Whether submitting again later may succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::SpawnFailed(_))
    }
}
