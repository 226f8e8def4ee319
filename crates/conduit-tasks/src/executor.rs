//! Worker pool that runs task bodies.

use std::fmt::Debug;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::error::{TaskError, TaskResult};

/// Where [`AsyncTaskManager`](crate::AsyncTaskManager) submits task bodies.
///
/// [`TaskExecutor`] runs them on tokio. Other implementations can run them
/// inline or on a dedicated pool.
pub trait TaskSpawner: Debug + Send + Sync + 'static {
    /// Starts `task`. An error means the body will never run.
    fn spawn_task(&self, task_id: u64, task: BoxFuture<'static, ()>) -> TaskResult<()>;

    /// Refuses further submissions.
    fn close(&self);

    /// Whether submissions are refused.
    fn is_shutdown(&self) -> bool;

    /// Bodies started and not yet finished.
    fn running(&self) -> u64;
}

/// Configuration for the task executor.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum number of task bodies running at once.
    pub max_concurrent: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 1000,
        }
    }
}

impl ExecutorConfig {
    /// Set maximum concurrent tasks.
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max;
        self
    }
}

/// Spawns task bodies on the tokio runtime and tracks how many are running.
#[derive(Debug)]
pub struct TaskExecutor {
    config: ExecutorConfig,
    running: Arc<AtomicU64>,
    shutdown: AtomicBool,
    handle: Option<Handle>,
}

impl TaskExecutor {
    /// Create an executor with default configuration.
    pub fn new() -> Self {
        Self::with_config(ExecutorConfig::default())
    }

    /// Create an executor with custom configuration.
    pub fn with_config(config: ExecutorConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicU64::new(0)),
            shutdown: AtomicBool::new(false),
            handle: None,
        }
    }

    /// Spawns onto `handle` instead of the runtime current at each call.
    #[must_use]
    pub fn with_handle(mut self, handle: Handle) -> Self {
        self.handle = Some(handle);
        self
    }

    /// Number of task bodies currently running.
    pub fn running(&self) -> u64 {
        self.running.load(Ordering::Acquire)
    }

    /// Whether the executor refuses new work.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Spawns `task`, identified by `task_id` in logs.
    ///
    /// Without a handle from [`with_handle`](Self::with_handle) this needs a
    /// current tokio runtime and fails with `SpawnFailed` otherwise.
    pub fn spawn<F>(&self, task_id: u64, task: F) -> TaskResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.is_shutdown() {
            return Err(TaskError::ShutDown);
        }

        let current_running = self.running.load(Ordering::Acquire);
        if current_running >= self.config.max_concurrent as u64 {
            return Err(TaskError::spawn_failed(format!(
                "max concurrent tasks ({}) reached",
                self.config.max_concurrent
            )));
        }

        let handle = match &self.handle {
            Some(handle) => handle.clone(),
            None => Handle::try_current()
                .map_err(|e| TaskError::spawn_failed(format!("no tokio runtime: {e}")))?,
        };

        let guard = RunningGuard::enter(Arc::clone(&self.running));
        debug!(task_id, "spawning task body");

        handle.spawn(async move {
            let _guard = guard;
            task.await;
            debug!(task_id, "task body finished");
        });

        Ok(())
    }

    /// Stops accepting new tasks. Running tasks are left to finish.
    pub fn close(&self) {
        if !self.shutdown.swap(true, Ordering::AcqRel) {
            info!(running = self.running(), "task executor closed");
        }
    }

    /// Closes the executor and waits up to `timeout` for running tasks.
    ///
    /// Returns `true` if every task finished in time.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.close();

        let deadline = tokio::time::Instant::now() + timeout;
        while self.running() > 0 {
            if tokio::time::Instant::now() >= deadline {
                warn!(
                    running = self.running(),
                    "shutdown timeout reached, tasks still running"
                );
                return false;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        info!("task executor shutdown complete");
        true
    }
}

impl TaskSpawner for TaskExecutor {
    fn spawn_task(&self, task_id: u64, task: BoxFuture<'static, ()>) -> TaskResult<()> {
        self.spawn(task_id, task)
    }

    fn close(&self) {
        TaskExecutor::close(self);
    }

    fn is_shutdown(&self) -> bool {
        TaskExecutor::is_shutdown(self)
    }

    fn running(&self) -> u64 {
        TaskExecutor::running(self)
    }
}

impl Default for TaskExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps the running count accurate even if the task is aborted.
struct RunningGuard(Arc<AtomicU64>);

impl RunningGuard {
    fn enter(running: Arc<AtomicU64>) -> Self {
        running.fetch_add(1, Ordering::AcqRel);
        Self(running)
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}
