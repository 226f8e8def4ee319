//! The connection seam the retry executor drives.

use std::future::Future;

use crate::error::DbResult;
use crate::isolation::IsolationLevel;

/// A database connection that supports explicit transactions.
///
/// Implement this for a pooled connection of whatever driver is in use.
/// The executor borrows the connection exclusively for the whole call.
pub trait TransactionalConnection: Send {
    /// Current isolation level.
    fn isolation_level(&mut self) -> impl Future<Output = DbResult<IsolationLevel>> + Send;

    /// Sets the isolation level for subsequent transactions.
    fn set_isolation_level(
        &mut self,
        level: IsolationLevel,
    ) -> impl Future<Output = DbResult<()>> + Send;

    /// Whether every statement commits on its own.
    fn auto_commit(&mut self) -> impl Future<Output = DbResult<bool>> + Send;

    /// Turns auto-commit on or off.
    fn set_auto_commit(&mut self, enabled: bool) -> impl Future<Output = DbResult<()>> + Send;

    /// Commits the open transaction.
    fn commit(&mut self) -> impl Future<Output = DbResult<()>> + Send;

    /// Rolls back the open transaction.
    fn rollback(&mut self) -> impl Future<Output = DbResult<()>> + Send;
}
