//! Fixed-interval maintenance loop.

use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use parking_lot::RwLock;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::error::{TaskError, TaskResult};

/// The sweep job handed to a [`MaintenanceSchedule`].
pub type MaintenanceJob = Arc<dyn Fn() + Send + Sync>;

/// Drives the periodic expiry sweep of an
/// [`AsyncTaskManager`](crate::AsyncTaskManager).
pub trait MaintenanceSchedule: Debug + Send + Sync + 'static {
    /// Starts calling `job` periodically.
    fn schedule(&self, job: MaintenanceJob) -> TaskResult<()>;

    /// Stops calling the job. A no-op if not started.
    fn cancel(&self) -> BoxFuture<'_, ()>;

    /// Time between two runs.
    fn period(&self) -> Duration;
}

/// Runs a job at a fixed interval until stopped.
///
/// The first run happens one full interval after [`start`](Self::start).
#[derive(Debug)]
pub struct MaintenanceScheduler {
    interval: Duration,
    running: AtomicBool,
    shutdown_tx: RwLock<Option<mpsc::Sender<()>>>,
    loop_handle: RwLock<Option<JoinHandle<()>>>,
}

impl MaintenanceScheduler {
    /// Create a scheduler ticking every `interval`.
    pub fn new(interval: Duration) -> TaskResult<Self> {
        if interval.is_zero() {
            return Err(TaskError::invalid_config(
                "maintenance interval must be positive",
            ));
        }
        Ok(Self {
            interval,
            running: AtomicBool::new(false),
            shutdown_tx: RwLock::new(None),
            loop_handle: RwLock::new(None),
        })
    }

    /// The tick interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether the loop is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Starts calling `job` every interval.
    ///
    /// Fails with `SpawnFailed` outside a tokio runtime.
    pub fn start<F>(&self, job: F) -> TaskResult<()>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let runtime = Handle::try_current()
            .map_err(|e| TaskError::spawn_failed(format!("no tokio runtime: {e}")))?;
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(TaskError::AlreadyRunning);
        }

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        *self.shutdown_tx.write() = Some(shutdown_tx);

        let period = self.interval;
        let handle = runtime.spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        debug!("running maintenance");
                        job();
                    }
                    _ = shutdown_rx.recv() => {
                        info!("maintenance scheduler received shutdown signal");
                        break;
                    }
                }
            }
        });

        *self.loop_handle.write() = Some(handle);
        info!(interval_ms = period.as_millis(), "maintenance scheduler started");

        Ok(())
    }

    /// Stops the loop and waits for it to exit. A no-op if not running.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::AcqRel) {
            return;
        }

        let shutdown_tx = self.shutdown_tx.write().take();
        if let Some(tx) = shutdown_tx {
            let _ = tx.send(()).await;
        }

        let handle = self.loop_handle.write().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }

        info!("maintenance scheduler stopped");
    }
}

impl MaintenanceSchedule for MaintenanceScheduler {
    fn schedule(&self, job: MaintenanceJob) -> TaskResult<()> {
        self.start(move || job())
    }

    fn cancel(&self) -> BoxFuture<'_, ()> {
        Box::pin(self.stop())
    }

    fn period(&self) -> Duration {
        self.interval
    }
}

impl Drop for MaintenanceScheduler {
    fn drop(&mut self) {
        if self.running.load(Ordering::Acquire) {
            if let Some(tx) = self.shutdown_tx.write().take() {
                let _ = tx.try_send(());
            }
        }
    }
}
