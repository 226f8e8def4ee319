//! Task manager driven by caller-supplied spawner and schedule, no runtime.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use conduit_tasks::{
    AsyncTaskManager, AsyncTaskManagerConfig, AsyncTaskOutcome, MaintenanceJob,
    MaintenanceSchedule, ManualClock, TaskError, TaskResult, TaskSpawner, TaskState,
};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use parking_lot::Mutex;

/// Runs each body to completion on the submitting thread.
#[derive(Debug, Default)]
struct InlineSpawner {
    closed: AtomicBool,
    spawned: AtomicU64,
}

impl TaskSpawner for InlineSpawner {
    fn spawn_task(&self, _task_id: u64, task: BoxFuture<'static, ()>) -> TaskResult<()> {
        if self.is_shutdown() {
            return Err(TaskError::ShutDown);
        }
        self.spawned.fetch_add(1, Ordering::SeqCst);
        task.now_or_never()
            .ok_or_else(|| TaskError::spawn_failed("body is not immediately ready"))
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn is_shutdown(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn running(&self) -> u64 {
        0
    }
}

/// Keeps the job so the test decides when a sweep happens.
#[derive(Default)]
struct ManualSchedule {
    job: Mutex<Option<MaintenanceJob>>,
}

impl std::fmt::Debug for ManualSchedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualSchedule")
            .field("scheduled", &self.job.lock().is_some())
            .finish()
    }
}

impl ManualSchedule {
    fn tick(&self) {
        let job = self.job.lock().clone();
        if let Some(job) = job {
            job();
        }
    }
}

impl MaintenanceSchedule for ManualSchedule {
    fn schedule(&self, job: MaintenanceJob) -> TaskResult<()> {
        let mut slot = self.job.lock();
        if slot.is_some() {
            return Err(TaskError::AlreadyRunning);
        }
        *slot = Some(job);
        Ok(())
    }

    fn cancel(&self) -> BoxFuture<'_, ()> {
        self.job.lock().take();
        Box::pin(async {})
    }

    fn period(&self) -> Duration {
        Duration::from_secs(60)
    }
}

struct Parts {
    manager: AsyncTaskManager,
    clock: Arc<ManualClock>,
    spawner: Arc<InlineSpawner>,
    schedule: Arc<ManualSchedule>,
}

fn parts() -> Parts {
    let clock = Arc::new(ManualClock::default());
    let spawner = Arc::new(InlineSpawner::default());
    let schedule = Arc::new(ManualSchedule::default());
    let manager = AsyncTaskManager::with_parts(
        AsyncTaskManagerConfig::default(),
        clock.clone(),
        spawner.clone(),
        schedule.clone(),
    );
    Parts {
        manager,
        clock,
        spawner,
        schedule,
    }
}

#[test]
fn test_inline_spawner_finishes_before_execute_returns() {
    let Parts {
        manager, spawner, ..
    } = parts();

    let task = manager
        .execute(async { AsyncTaskOutcome::ok("42 rows") }, Duration::from_secs(60))
        .unwrap();

    // The returned snapshot is the submission; the table already holds the result.
    assert_eq!(task.state, TaskState::New);
    let stored = manager.get_task_data(task.id, &task.token).unwrap();
    assert_eq!(stored.state, TaskState::EndedOk);
    assert_eq!(stored.payload.as_deref(), Some("42 rows"));
    assert_eq!(spawner.spawned.load(Ordering::SeqCst), 1);
}

#[test]
fn test_inline_panic_is_captured() {
    let Parts { manager, .. } = parts();

    let task = manager
        .execute(
            async {
                let rows: Vec<u8> = Vec::new();
                AsyncTaskOutcome::ok(rows[3].to_string())
            },
            Duration::from_secs(60),
        )
        .unwrap();

    let stored = manager.get_task_data(task.id, &task.token).unwrap();
    assert_eq!(stored.state, TaskState::EndedError);
    assert!(stored.payload.unwrap().starts_with("Exception: "));
}

#[test]
fn test_rejected_spawn_leaves_no_record() {
    let Parts { manager, .. } = parts();

    let err = manager
        .execute(
            async {
                futures_util::future::pending::<()>().await;
                AsyncTaskOutcome::Ok(None)
            },
            Duration::from_secs(60),
        )
        .unwrap_err();

    assert!(matches!(err, TaskError::SpawnFailed(_)));
    assert!(manager.is_empty());
}

#[test]
fn test_injected_schedule_drives_the_sweep() {
    let Parts {
        manager,
        clock,
        schedule,
        ..
    } = parts();
    manager.start().unwrap();
    assert!(matches!(manager.start().unwrap_err(), TaskError::AlreadyRunning));

    let short = manager
        .execute(async { AsyncTaskOutcome::Ok(None) }, Duration::from_secs(5))
        .unwrap();
    let long = manager
        .execute(async { AsyncTaskOutcome::Ok(None) }, Duration::from_secs(500))
        .unwrap();

    clock.advance(Duration::from_secs(10));
    schedule.tick();

    assert!(manager.get_task_data(short.id, &short.token).is_none());
    assert!(manager.get_task_data(long.id, &long.token).is_some());
}

#[test]
fn test_shutdown_closes_injected_parts() {
    let Parts {
        manager,
        spawner,
        schedule,
        ..
    } = parts();
    manager.start().unwrap();

    futures_util::FutureExt::now_or_never(manager.shutdown()).unwrap();

    assert!(spawner.is_shutdown());
    assert!(schedule.job.lock().is_none());
    assert!(matches!(
        manager
            .execute(async { AsyncTaskOutcome::Ok(None) }, Duration::from_secs(1))
            .unwrap_err(),
        TaskError::ShutDown
    ));
}
