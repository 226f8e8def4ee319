//! In-memory connection for tests.
//!
//! [`MockConnection`] records every call the executor makes, so tests can
//! assert on the exact sequence of transaction operations.
//!
//! ```rust
//! use conduit_db::fixtures::{ConnectionEvent, MockConnection};
//! use conduit_db::{IsolationLevel, TransactionalConnection};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut conn = MockConnection::new(IsolationLevel::ReadCommitted);
//! conn.commit().await.unwrap();
//! assert_eq!(conn.events(), &[ConnectionEvent::Commit]);
//! # }
//! ```

use std::collections::VecDeque;

use crate::connection::TransactionalConnection;
use crate::error::{DbError, DbResult};
use crate::isolation::IsolationLevel;

/// One call made on a [`MockConnection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// `set_auto_commit(enabled)`
    SetAutoCommit(bool),
    /// `set_isolation_level(level)`
    SetIsolation(IsolationLevel),
    /// `commit()`
    Commit,
    /// `rollback()`
    Rollback,
}

/// A connection that keeps its state in memory and logs every call.
#[derive(Debug)]
pub struct MockConnection {
    isolation: IsolationLevel,
    auto_commit: bool,
    events: Vec<ConnectionEvent>,
    commit_failures: VecDeque<DbError>,
    fail_rollback: bool,
    fail_set_isolation: bool,
    fail_begin: bool,
}

impl MockConnection {
    /// A connection in auto-commit mode at `isolation`.
    #[must_use]
    pub fn new(isolation: IsolationLevel) -> Self {
        Self {
            isolation,
            auto_commit: true,
            events: Vec::new(),
            commit_failures: VecDeque::new(),
            fail_rollback: false,
            fail_set_isolation: false,
            fail_begin: false,
        }
    }

    /// Makes the next `commit()` fail with `error`. Queued failures are
    /// consumed in order.
    #[must_use]
    pub fn with_commit_failure(mut self, error: DbError) -> Self {
        self.commit_failures.push_back(error);
        self
    }

    /// Makes every `rollback()` fail.
    #[must_use]
    pub const fn with_failing_rollback(mut self) -> Self {
        self.fail_rollback = true;
        self
    }

    /// Makes every `set_isolation_level()` fail.
    #[must_use]
    pub const fn with_failing_set_isolation(mut self) -> Self {
        self.fail_set_isolation = true;
        self
    }

    /// Makes every `set_auto_commit(false)` fail.
    #[must_use]
    pub const fn with_failing_begin(mut self) -> Self {
        self.fail_begin = true;
        self
    }

    /// Calls made so far.
    pub fn events(&self) -> &[ConnectionEvent] {
        &self.events
    }

    /// Number of commits.
    pub fn commits(&self) -> usize {
        self.count(ConnectionEvent::Commit)
    }

    /// Number of rollbacks.
    pub fn rollbacks(&self) -> usize {
        self.count(ConnectionEvent::Rollback)
    }

    /// Current isolation level.
    pub const fn current_isolation(&self) -> IsolationLevel {
        self.isolation
    }

    /// Current auto-commit mode.
    pub const fn is_auto_commit(&self) -> bool {
        self.auto_commit
    }

    fn count(&self, event: ConnectionEvent) -> usize {
        self.events.iter().filter(|e| **e == event).count()
    }
}

impl TransactionalConnection for MockConnection {
    async fn isolation_level(&mut self) -> DbResult<IsolationLevel> {
        Ok(self.isolation)
    }

    async fn set_isolation_level(&mut self, level: IsolationLevel) -> DbResult<()> {
        self.events.push(ConnectionEvent::SetIsolation(level));
        if self.fail_set_isolation {
            return Err(DbError::driver("08003", "connection closed"));
        }
        self.isolation = level;
        Ok(())
    }

    async fn auto_commit(&mut self) -> DbResult<bool> {
        Ok(self.auto_commit)
    }

    async fn set_auto_commit(&mut self, enabled: bool) -> DbResult<()> {
        self.events.push(ConnectionEvent::SetAutoCommit(enabled));
        if self.fail_begin && !enabled {
            return Err(DbError::driver("08S01", "communication link failure"));
        }
        self.auto_commit = enabled;
        Ok(())
    }

    async fn commit(&mut self) -> DbResult<()> {
        self.events.push(ConnectionEvent::Commit);
        match self.commit_failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn rollback(&mut self) -> DbResult<()> {
        self.events.push(ConnectionEvent::Rollback);
        if self.fail_rollback {
            return Err(DbError::driver("08006", "connection failure"));
        }
        Ok(())
    }
}
