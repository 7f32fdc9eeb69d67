use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time;

use applied_api::errors::TaskError;

use super::queue::{ScheduledTask, SchedulingQueue};

/// # Worker Implementation
///
/// One of the pool's fixed set of workers. Each worker pulls tasks from the
/// shared scheduling queue and runs them one at a time.
///
/// ## Core Algorithm
/// 1. Pull a task from the shared queue
/// 2. Run it on the current thread under panic recovery
/// 3. Report the outcome on the task's completion channel
/// 4. When the queue is empty, wait for a wakeup or the idle tick
/// 5. Repeat until the shutdown flag is set
///
/// A panicking task never takes the worker down with it.
pub(crate) struct Worker {
    /// Unique identifier for this worker
    id: usize,

    /// Queue providing tasks to run
    scheduling_queue: Arc<SchedulingQueue>,

    /// Signal for worker shutdown
    shutdown_flag: Arc<AtomicBool>,

    /// Current worker status
    status: Arc<AtomicUsize>,

    /// Pool-wide counters
    stats: Arc<WorkerStats>,

    /// Duration to sleep when idle before checking for work again
    idle_sleep_duration: Duration,
}

/// Status codes for worker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    /// Worker is idle, waiting for work
    Idle = 0,

    /// Worker is running a task
    Processing = 1,

    /// Worker is shutting down
    ShuttingDown = 2,
}

/// Counters shared by every worker of a pool.
#[derive(Debug, Default)]
pub(crate) struct WorkerStats {
    pub completed: AtomicUsize,
    pub failed: AtomicUsize,
}

impl fmt::Debug for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("id", &self.id)
            .field("status", &self.status.load(Ordering::Relaxed))
            .finish()
    }
}

impl Worker {
    /// Creates a new worker
    ///
    /// ## Parameters
    /// - `id`: Unique identifier for this worker
    /// - `scheduling_queue`: Queue providing tasks to run
    /// - `shutdown_flag`: Signal for worker shutdown
    /// - `stats`: Pool-wide completion counters
    /// - `idle_sleep_duration`: Fallback poll interval while idle
    pub fn new(
        id: usize,
        scheduling_queue: Arc<SchedulingQueue>,
        shutdown_flag: Arc<AtomicBool>,
        stats: Arc<WorkerStats>,
        idle_sleep_duration: Duration,
    ) -> Self {
        Self {
            id,
            scheduling_queue,
            shutdown_flag,
            status: Arc::new(AtomicUsize::new(WorkerStatus::Idle as usize)),
            stats,
            idle_sleep_duration,
        }
    }

    /// Shared view of this worker's status
    pub fn status(&self) -> Arc<AtomicUsize> {
        self.status.clone()
    }

    /// Launches the worker's main loop on the given runtime
    pub fn spawn(self, runtime_handle: &Handle) -> JoinHandle<()> {
        runtime_handle.spawn(async move {
            self.run_loop().await;
        })
    }

    /// Main worker loop
    async fn run_loop(&self) {
        while !self.shutdown_flag.load(Ordering::Acquire) {
            match self.scheduling_queue.try_pop() {
                Some(task) => {
                    self.status.store(WorkerStatus::Processing as usize, Ordering::Relaxed);
                    // Hand this thread's other tasks to the rest of the runtime while
                    // the callback blocks.
                    tokio::task::block_in_place(|| self.execute(task));
                    self.status.store(WorkerStatus::Idle as usize, Ordering::Relaxed);
                }
                None => {
                    let notify = self.scheduling_queue.notify_handle();
                    tokio::select! {
                        _ = notify.notified() => {}
                        _ = time::sleep(self.idle_sleep_duration) => {}
                    }
                }
            }
        }

        self.status.store(WorkerStatus::ShuttingDown as usize, Ordering::Relaxed);
        tracing::trace!(worker = self.id, "worker stopped");
    }

    /// Runs one task and reports its outcome
    fn execute(&self, task: ScheduledTask) {
        let ScheduledTask { id, job, done } = task;

        let outcome = match panic::catch_unwind(AssertUnwindSafe(job)) {
            Ok(()) => {
                self.stats.completed.fetch_add(1, Ordering::Relaxed);
                crate::log_task!(id, "completed", worker = self.id);
                Ok(())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                crate::log_error!("task", &message, worker = self.id, task = id);
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                Err(TaskError::Panicked(message))
            }
        };

        // The handle may already be gone; nobody is waiting in that case.
        let _ = done.send(outcome);
    }
}

/// Extracts a readable message from a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
