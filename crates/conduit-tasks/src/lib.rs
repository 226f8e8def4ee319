//! # Conduit Tasks
//!
//! Background execution of long-running work whose outcome clients poll for.
//!
//! A handler submits a task to the [`AsyncTaskManager`] and immediately gets
//! back an [`AsyncTaskData`] record in the `NEW` state, carrying a sequential
//! id and a random token. The task body runs on the tokio runtime; when it
//! finishes, the stored record is replaced by an `ENDED_OK` or `ENDED_ERROR`
//! record with the payload the body returned.
//!
//! Clients poll with [`AsyncTaskManager::get_task_data`] and release the
//! record with [`AsyncTaskManager::acknowledge`]. Both require the token.
//! Records nobody acknowledges are removed by a periodic sweep once their
//! TTL has elapsed, whatever their state.
//!
//! Task bodies go through a [`TaskSpawner`] and the sweep is driven by a
//! [`MaintenanceSchedule`]. The tokio-backed [`TaskExecutor`] and
//! [`MaintenanceScheduler`] are the defaults; others can be passed to
//! [`AsyncTaskManager::with_parts`].
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use conduit_tasks::{AsyncTaskManager, AsyncTaskManagerConfig, AsyncTaskOutcome, TaskState};
//!
//! #[tokio::main]
//! async fn main() {
//!     let manager = AsyncTaskManager::new(
//!         AsyncTaskManagerConfig::default().with_maintenance_interval(Duration::from_secs(30)),
//!     )
//!     .unwrap();
//!     manager.start().unwrap();
//!
//!     let task = manager
//!         .execute_with_default_ttl(async {
//!             tokio::time::sleep(Duration::from_secs(2)).await;
//!             AsyncTaskOutcome::ok("export ready")
//!         })
//!         .unwrap();
//!
//!     tokio::time::sleep(Duration::from_secs(3)).await;
//!     let data = manager.get_task_data(task.id, &task.token).unwrap();
//!     assert_eq!(data.state, TaskState::EndedOk);
//!     manager.acknowledge(task.id, &task.token);
//!
//!     manager.shutdown().await;
//! }
//! ```

mod clock;
mod data;
mod error;
mod executor;
mod manager;
mod scheduler;

pub use clock::{Clock, ManualClock, SystemClock};
pub use data::{AsyncTaskData, AsyncTaskOutcome, TaskState};
pub use error::{TaskError, TaskResult};
pub use executor::{ExecutorConfig, TaskExecutor, TaskSpawner};
pub use manager::{AsyncTaskManager, AsyncTaskManagerConfig};
pub use scheduler::{MaintenanceJob, MaintenanceSchedule, MaintenanceScheduler};
