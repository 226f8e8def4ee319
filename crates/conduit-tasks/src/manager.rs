//! The asynchronous task manager.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures_util::FutureExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::data::{AsyncTaskData, AsyncTaskOutcome, TaskState};
use crate::error::{TaskError, TaskResult};
use crate::executor::{ExecutorConfig, TaskExecutor, TaskSpawner};
use crate::scheduler::{MaintenanceSchedule, MaintenanceScheduler};

/// Configuration for [`AsyncTaskManager`].
#[derive(Debug, Clone)]
pub struct AsyncTaskManagerConfig {
    /// How often expired records are swept.
    pub maintenance_interval: Duration,
    /// TTL used by [`AsyncTaskManager::execute_with_default_ttl`].
    pub default_ttl: Duration,
    /// Maximum number of task bodies running at once.
    pub max_concurrent: usize,
}

impl Default for AsyncTaskManagerConfig {
    fn default() -> Self {
        Self {
            maintenance_interval: Duration::from_secs(60),
            default_ttl: Duration::from_secs(300),
            max_concurrent: 1000,
        }
    }
}

impl AsyncTaskManagerConfig {
    /// Set the sweep interval.
    pub fn with_maintenance_interval(mut self, interval: Duration) -> Self {
        self.maintenance_interval = interval;
        self
    }

    /// Set the default TTL.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Set maximum concurrent task bodies.
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max;
        self
    }
}

type TaskTable = DashMap<u64, AsyncTaskData>;

/// Runs tasks in the background and keeps their outcome until the client
/// acknowledges it or its TTL runs out.
///
/// Each submission gets a sequential id and a random token. The token must
/// be presented to read or acknowledge the record.
///
/// ```rust
/// use std::time::Duration;
/// use conduit_tasks::{AsyncTaskManager, AsyncTaskManagerConfig, AsyncTaskOutcome};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let manager = AsyncTaskManager::new(AsyncTaskManagerConfig::default()).unwrap();
/// let task = manager
///     .execute(async { AsyncTaskOutcome::ok("report.pdf") }, Duration::from_secs(60))
///     .unwrap();
///
/// // Poll with the token handed out at submission.
/// assert!(manager.get_task_data(task.id, &task.token).is_some());
/// assert!(manager.get_task_data(task.id, "guess").is_none());
/// # }
/// ```
#[derive(Debug)]
pub struct AsyncTaskManager {
    config: AsyncTaskManagerConfig,
    tasks: Arc<TaskTable>,
    next_id: AtomicU64,
    clock: Arc<dyn Clock>,
    spawner: Arc<dyn TaskSpawner>,
    schedule: Arc<dyn MaintenanceSchedule>,
}

impl AsyncTaskManager {
    /// Create a manager using the system clock.
    pub fn new(config: AsyncTaskManagerConfig) -> TaskResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a manager reading time from `clock`, running tasks on tokio.
    pub fn with_clock(config: AsyncTaskManagerConfig, clock: Arc<dyn Clock>) -> TaskResult<Self> {
        if config.max_concurrent == 0 {
            return Err(TaskError::invalid_config("max_concurrent must be positive"));
        }
        let schedule = MaintenanceScheduler::new(config.maintenance_interval)?;
        let spawner = TaskExecutor::with_config(
            ExecutorConfig::default().with_max_concurrent(config.max_concurrent),
        );

        Ok(Self::with_parts(
            config,
            clock,
            Arc::new(spawner),
            Arc::new(schedule),
        ))
    }

    /// Create a manager from explicit collaborators.
    ///
    /// `spawner` runs task bodies and `schedule` drives the expiry sweep.
    /// `config.max_concurrent` and `config.maintenance_interval` are not
    /// consulted; the collaborators carry their own limits.
    pub fn with_parts(
        config: AsyncTaskManagerConfig,
        clock: Arc<dyn Clock>,
        spawner: Arc<dyn TaskSpawner>,
        schedule: Arc<dyn MaintenanceSchedule>,
    ) -> Self {
        Self {
            config,
            tasks: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(1),
            clock,
            spawner,
            schedule,
        }
    }

    /// The manager's configuration.
    pub fn config(&self) -> &AsyncTaskManagerConfig {
        &self.config
    }

    /// Submits `task` and returns its `NEW` record without waiting.
    ///
    /// The record is kept for `ttl` after submission, whatever its state.
    /// A panic inside `task` ends it in `ENDED_ERROR` with the panic message
    /// as payload.
    pub fn execute<F>(&self, task: F, ttl: Duration) -> TaskResult<AsyncTaskData>
    where
        F: Future<Output = AsyncTaskOutcome> + Send + 'static,
    {
        if self.spawner.is_shutdown() {
            return Err(TaskError::ShutDown);
        }

        // Inserted before spawning so an inline spawner finds it on completion.
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let data = AsyncTaskData::new(id, self.clock.now(), ttl, Uuid::new_v4().to_string());
        self.tasks.insert(id, data.clone());

        let tasks = Arc::clone(&self.tasks);
        let spawned = self.spawner.spawn_task(id, Box::pin(async move {
            let outcome = match AssertUnwindSafe(task).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    warn!(task_id = id, panic = %message, "task panicked");
                    AsyncTaskOutcome::Error(Some(format!("Exception: {message}")))
                }
            };
            complete(&tasks, id, outcome);
        }));

        if let Err(err) = spawned {
            self.tasks.remove(&id);
            warn!(task_id = id, error = %err, "task not submitted");
            return Err(err);
        }

        conduit_telemetry::metrics::record_task_submitted();
        debug!(task_id = id, ttl_ms = ttl.as_millis(), "task submitted");
        Ok(data)
    }

    /// Submits `task` with the configured default TTL.
    pub fn execute_with_default_ttl<F>(&self, task: F) -> TaskResult<AsyncTaskData>
    where
        F: Future<Output = AsyncTaskOutcome> + Send + 'static,
    {
        self.execute(task, self.config.default_ttl)
    }

    /// The current record for `id`, if it exists and `token` matches.
    pub fn get_task_data(&self, id: u64, token: &str) -> Option<AsyncTaskData> {
        self.tasks
            .get(&id)
            .filter(|entry| entry.token == token)
            .map(|entry| entry.value().clone())
    }

    /// Removes the record for `id` if `token` matches.
    ///
    /// Returns whether a record was removed. Unknown ids and wrong tokens
    /// are ignored.
    pub fn acknowledge(&self, id: u64, token: &str) -> bool {
        let removed = self.tasks.remove_if(&id, |_, data| data.token == token);
        if removed.is_some() {
            debug!(task_id = id, "task acknowledged");
        }
        removed.is_some()
    }

    /// Alias of [`acknowledge`](Self::acknowledge).
    pub fn ack(&self, id: u64, token: &str) -> bool {
        self.acknowledge(id, token)
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no records are stored.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Sweeps expired records now and returns how many were removed.
    pub fn run_maintenance(&self) -> usize {
        sweep(&self.tasks, self.clock.as_ref())
    }

    /// Starts the periodic sweep.
    pub fn start(&self) -> TaskResult<()> {
        if self.spawner.is_shutdown() {
            return Err(TaskError::ShutDown);
        }

        let tasks = Arc::clone(&self.tasks);
        let clock = Arc::clone(&self.clock);
        self.schedule.schedule(Arc::new(move || {
            sweep(&tasks, clock.as_ref());
        }))?;

        info!(
            maintenance_interval_ms = self.schedule.period().as_millis(),
            "async task manager started"
        );
        Ok(())
    }

    /// Stops sweeping and refuses new submissions.
    ///
    /// Tasks already running are not cancelled; their records keep
    /// updating until the manager is dropped.
    pub async fn shutdown(&self) {
        self.schedule.cancel().await;
        self.spawner.close();
        info!(stored = self.len(), "async task manager shut down");
    }

    /// Waits up to `timeout` for running task bodies to finish.
    ///
    /// Returns `true` if none are left running.
    pub async fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while self.spawner.running() > 0 {
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        true
    }
}

/// Replaces the stored record with its finished version. A record that was
/// already acknowledged or swept stays gone.
fn complete(tasks: &TaskTable, id: u64, outcome: AsyncTaskOutcome) {
    let (state, payload) = outcome.into_parts();
    conduit_telemetry::metrics::record_task_completed(state == TaskState::EndedOk);

    match tasks.get_mut(&id) {
        Some(mut entry) => {
            let finished = entry.finished(state, payload);
            *entry = finished;
            debug!(task_id = id, state = %state, "task finished");
        }
        None => debug!(task_id = id, state = %state, "task finished after its record was removed"),
    }
}

fn sweep(tasks: &TaskTable, clock: &dyn Clock) -> usize {
    let now = clock.now();
    let mut removed = 0;
    tasks.retain(|_, data| {
        let keep = !data.is_expired(now);
        if !keep {
            removed += 1;
        }
        keep
    });

    if removed > 0 {
        info!(removed, remaining = tasks.len(), "expired async tasks removed");
    }
    conduit_telemetry::metrics::record_tasks_expired(removed);
    removed
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
