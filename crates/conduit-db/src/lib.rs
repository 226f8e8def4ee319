//! # Conduit DB
//!
//! Transaction execution with isolation control and conflict retry.
//!
//! - [`TransactionalConnection`] - The connection seam a driver implements
//! - [`run_with_retry`] - Retry a unit of work on serialization/deadlock
//!   conflicts, with linear backoff and cooperative cancellation
//! - [`run_in_transaction`] - Single-attempt transaction
//! - [`RetryPolicy`] / [`ConflictCodes`] - Attempts, backoff and the driver
//!   codes that count as conflicts
//! - [`fixtures`] - An in-memory connection for tests

#![doc(html_root_url = "https://docs.rs/conduit-db/0.1.0")]

mod cancel;
mod connection;
mod error;
pub mod fixtures;
mod isolation;
mod policy;
mod retry;

pub use cancel::CancelSignal;
pub use connection::TransactionalConnection;
pub use error::{DbError, DbResult, INTERRUPTED, MAX_RETRIES_EXCEEDED};
pub use isolation::IsolationLevel;
pub use policy::{ConflictCodes, RetryPolicy};
pub use retry::{
    run_in_transaction, run_read_committed_with_retry, run_repeatable_read_with_retry,
    run_serializable_with_retry, run_with_retry, TransactionRetryExecutor,
};
