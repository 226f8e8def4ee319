//! Transaction execution with conflict retry.
//!
//! [`run_with_retry`] runs a unit of work inside a transaction at a chosen
//! isolation level. Failures carrying one of the policy's conflict codes are
//! rolled back and retried after a linear backoff; any other failure is
//! rolled back and returned at once. Whatever happens, the connection leaves
//! each attempt with its original isolation level and auto-commit on.
//!
//! A unit of work borrows the connection for one attempt:
//!
//! ```rust
//! use conduit_db::fixtures::MockConnection;
//! use conduit_db::{run_serializable_with_retry, CancelSignal, DbError, IsolationLevel, RetryPolicy};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), DbError> {
//! let mut conn = MockConnection::new(IsolationLevel::ReadCommitted);
//! let total = run_serializable_with_retry(
//!     &mut conn,
//!     &RetryPolicy::default(),
//!     &CancelSignal::new(),
//!     |_conn| Box::pin(async move { Ok(42) }),
//! )
//! .await?;
//!
//! assert_eq!(total, 42);
//! assert_eq!(conn.commits(), 1);
//! assert_eq!(conn.current_isolation(), IsolationLevel::ReadCommitted);
//! # Ok(())
//! # }
//! ```

use futures_util::future::BoxFuture;

use crate::cancel::CancelSignal;
use crate::connection::TransactionalConnection;
use crate::error::{DbError, DbResult, INTERRUPTED, MAX_RETRIES_EXCEEDED};
use crate::isolation::IsolationLevel;
use crate::policy::RetryPolicy;

/// Runs `work` at `isolation`, retrying on conflicts.
///
/// The number of attempts is `policy.max_retries` (at least one). The
/// signal is checked before every attempt and interrupts a backoff sleep.
///
/// # Errors
///
/// - [`DbError::RetryFailed`] with `"Max retries exceeded"` once every
///   attempt hit a conflict
/// - [`DbError::RetryFailed`] with `"Thread interrupted"` if `cancel`
///   fired before an attempt or during a backoff
/// - the unit of work's own error for any non-conflict failure
/// - the connection's error if the current isolation level cannot be read
///   or the transaction cannot be opened
pub async fn run_with_retry<C, T, F>(
    conn: &mut C,
    isolation: IsolationLevel,
    policy: &RetryPolicy,
    cancel: &CancelSignal,
    mut work: F,
) -> DbResult<T>
where
    C: TransactionalConnection,
    T: Send,
    F: for<'c> FnMut(&'c mut C) -> BoxFuture<'c, DbResult<T>> + Send,
{
    let original = conn.isolation_level().await?;
    let attempts = policy.attempts();

    for attempt in 0..attempts {
        if cancel.is_cancelled() {
            return Err(DbError::retry_failed(INTERRUPTED));
        }

        let outcome = run_attempt(conn, isolation, &mut work).await;
        restore(conn, original).await;

        let err = match outcome {
            Ok(value) => {
                if attempt > 0 {
                    tracing::debug!(attempt, isolation = %isolation, "transaction committed after retry");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        let is_conflict = err
            .sql_state()
            .is_some_and(|code| policy.conflict_codes.is_conflict(code));
        if !is_conflict {
            return Err(err);
        }

        let remaining = attempts - attempt - 1;
        tracing::warn!(
            attempt,
            remaining,
            isolation = %isolation,
            error = %err,
            "transaction conflict"
        );
        // Last attempt failed: give up without a final backoff sleep.
        if remaining == 0 {
            break;
        }
        conduit_telemetry::metrics::record_transaction_retry(isolation.as_str());

        if !policy.initial_backoff.is_zero() {
            let delay = policy.backoff_for(attempt);
            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = cancel.cancelled() => {
                    return Err(DbError::retry_failed(INTERRUPTED));
                }
            }
        }
    }

    Err(DbError::retry_failed(MAX_RETRIES_EXCEEDED))
}

/// [`run_with_retry`] at [`IsolationLevel::Serializable`].
pub async fn run_serializable_with_retry<C, T, F>(
    conn: &mut C,
    policy: &RetryPolicy,
    cancel: &CancelSignal,
    work: F,
) -> DbResult<T>
where
    C: TransactionalConnection,
    T: Send,
    F: for<'c> FnMut(&'c mut C) -> BoxFuture<'c, DbResult<T>> + Send,
{
    run_with_retry(conn, IsolationLevel::Serializable, policy, cancel, work).await
}

/// [`run_with_retry`] at [`IsolationLevel::ReadCommitted`].
pub async fn run_read_committed_with_retry<C, T, F>(
    conn: &mut C,
    policy: &RetryPolicy,
    cancel: &CancelSignal,
    work: F,
) -> DbResult<T>
where
    C: TransactionalConnection,
    T: Send,
    F: for<'c> FnMut(&'c mut C) -> BoxFuture<'c, DbResult<T>> + Send,
{
    run_with_retry(conn, IsolationLevel::ReadCommitted, policy, cancel, work).await
}

/// [`run_with_retry`] at [`IsolationLevel::RepeatableRead`].
pub async fn run_repeatable_read_with_retry<C, T, F>(
    conn: &mut C,
    policy: &RetryPolicy,
    cancel: &CancelSignal,
    work: F,
) -> DbResult<T>
where
    C: TransactionalConnection,
    T: Send,
    F: for<'c> FnMut(&'c mut C) -> BoxFuture<'c, DbResult<T>> + Send,
{
    run_with_retry(conn, IsolationLevel::RepeatableRead, policy, cancel, work).await
}

/// Runs `work` in a single transaction without touching the isolation
/// level: commit on success, roll back on failure.
pub async fn run_in_transaction<C, T, F>(conn: &mut C, work: F) -> DbResult<T>
where
    C: TransactionalConnection,
    T: Send,
    F: for<'c> FnOnce(&'c mut C) -> BoxFuture<'c, DbResult<T>> + Send,
{
    if let Err(err) = conn.set_auto_commit(false).await {
        rollback_quietly(conn).await;
        return Err(err);
    }

    let outcome = match work(conn).await {
        Ok(value) => commit_or_rollback(conn, value).await,
        Err(err) => {
            rollback_quietly(conn).await;
            Err(err)
        }
    };

    if let Err(err) = conn.set_auto_commit(true).await {
        tracing::warn!(error = %err, "failed to re-enable auto-commit");
    }
    outcome
}

/// A retry policy and cancel signal bundled for repeated use.
#[derive(Debug, Clone, Default)]
pub struct TransactionRetryExecutor {
    policy: RetryPolicy,
    cancel: CancelSignal,
}

impl TransactionRetryExecutor {
    /// Creates an executor with its own cancel signal.
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            cancel: CancelSignal::new(),
        }
    }

    /// Shares an existing cancel signal.
    #[must_use]
    pub fn with_cancel_signal(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }

    /// The retry policy.
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// The cancel signal checked between attempts.
    pub const fn cancel_signal(&self) -> &CancelSignal {
        &self.cancel
    }

    /// See [`run_with_retry`].
    pub async fn run<C, T, F>(&self, conn: &mut C, isolation: IsolationLevel, work: F) -> DbResult<T>
    where
        C: TransactionalConnection,
        T: Send,
        F: for<'c> FnMut(&'c mut C) -> BoxFuture<'c, DbResult<T>> + Send,
    {
        run_with_retry(conn, isolation, &self.policy, &self.cancel, work).await
    }

    /// See [`run_serializable_with_retry`].
    pub async fn run_serializable<C, T, F>(&self, conn: &mut C, work: F) -> DbResult<T>
    where
        C: TransactionalConnection,
        T: Send,
        F: for<'c> FnMut(&'c mut C) -> BoxFuture<'c, DbResult<T>> + Send,
    {
        self.run(conn, IsolationLevel::Serializable, work).await
    }
}

async fn run_attempt<C, T, F>(conn: &mut C, isolation: IsolationLevel, work: &mut F) -> DbResult<T>
where
    C: TransactionalConnection,
    T: Send,
    F: for<'c> FnMut(&'c mut C) -> BoxFuture<'c, DbResult<T>> + Send,
{
    let opened = async {
        conn.set_auto_commit(false).await?;
        conn.set_isolation_level(isolation).await
    }
    .await;
    if let Err(err) = opened {
        rollback_quietly(conn).await;
        return Err(err);
    }

    match work(conn).await {
        Ok(value) => commit_or_rollback(conn, value).await,
        Err(err) => {
            rollback_quietly(conn).await;
            Err(err)
        }
    }
}

async fn commit_or_rollback<C, T>(conn: &mut C, value: T) -> DbResult<T>
where
    C: TransactionalConnection,
{
    match conn.commit().await {
        Ok(()) => Ok(value),
        Err(err) => {
            rollback_quietly(conn).await;
            Err(err)
        }
    }
}

async fn rollback_quietly<C: TransactionalConnection>(conn: &mut C) {
    if let Err(err) = conn.rollback().await {
        tracing::warn!(error = %err, "rollback failed");
    }
}

async fn restore<C: TransactionalConnection>(conn: &mut C, original: IsolationLevel) {
    if let Err(err) = conn.set_isolation_level(original).await {
        tracing::warn!(isolation = %original, error = %err, "failed to restore isolation level");
    }
    if let Err(err) = conn.set_auto_commit(true).await {
        tracing::warn!(error = %err, "failed to re-enable auto-commit");
    }
}
