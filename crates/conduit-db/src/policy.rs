//! Retry policy.

use std::time::Duration;

/// Driver codes that mark an attempt as a retryable conflict.
///
/// Defaults to the SQLSTATE codes for serialization failure (`40001`) and
/// deadlock (`40P01`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictCodes {
    /// Code reported for a serialization failure.
    pub serialization_failure: String,
    /// Code reported for a detected deadlock.
    pub deadlock: String,
}

impl ConflictCodes {
    /// Creates a pair of conflict codes.
    pub fn new(serialization_failure: impl Into<String>, deadlock: impl Into<String>) -> Self {
        Self {
            serialization_failure: serialization_failure.into(),
            deadlock: deadlock.into(),
        }
    }

    /// Returns `true` if `code` is one of the conflict codes.
    #[must_use]
    pub fn is_conflict(&self, code: &str) -> bool {
        code == self.serialization_failure || code == self.deadlock
    }
}

impl Default for ConflictCodes {
    fn default() -> Self {
        Self::new("40001", "40P01")
    }
}

/// How often and how patiently a transaction is retried.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use conduit_db::RetryPolicy;
///
/// let policy = RetryPolicy::default().with_max_retries(3);
/// assert_eq!(policy.backoff_for(0), Duration::from_millis(100));
/// assert_eq!(policy.backoff_for(2), Duration::from_millis(300));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts. Zero is treated as one.
    pub max_retries: u32,
    /// Base delay; the wait after the n-th conflict (0-based) is
    /// `initial_backoff * (n + 1)`. Zero disables waiting.
    pub initial_backoff: Duration,
    /// Codes that trigger a retry.
    pub conflict_codes: ConflictCodes,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_backoff: Duration::from_millis(100),
            conflict_codes: ConflictCodes::default(),
        }
    }
}

impl RetryPolicy {
    /// Sets the maximum number of attempts.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the base backoff delay.
    #[must_use]
    pub const fn with_initial_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    /// Sets the conflict codes.
    #[must_use]
    pub fn with_conflict_codes(mut self, conflict_codes: ConflictCodes) -> Self {
        self.conflict_codes = conflict_codes;
        self
    }

    /// Number of attempts the executor will make.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Delay after the `attempt`-th conflict, counting from zero.
    ///
    /// Grows linearly and saturates at [`Duration::MAX`].
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .checked_mul(attempt.saturating_add(1))
            .unwrap_or(Duration::MAX)
    }
}
