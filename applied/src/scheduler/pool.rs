use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use applied_api::errors::{AppliedError, AppliedResult};
use applied_api::runner::Task;

use super::handle::TaskHandle;
use super::queue::{ScheduledTask, SchedulingQueue};
use super::worker::{Worker, WorkerStats, WorkerStatus};
use crate::config::ExecutorConfig;

/// Status codes for the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerStatus {
    /// Pool is accepting and running work
    Running = 0,

    /// Pool is shutting down
    ShuttingDown = 1,

    /// Pool has released its workers
    Shutdown = 2,
}

/// Metrics about the pool state
#[derive(Debug, Clone)]
pub struct PoolMetrics {
    /// Number of workers in the pool
    pub pool_size: usize,

    /// Current length of the scheduling queue
    pub queue_length: usize,

    /// Number of workers currently running a task
    pub busy_workers: usize,

    /// Whether the pool is shutting down
    pub is_shutting_down: bool,

    /// Current status of the pool
    pub status: SchedulerStatus,

    /// Tasks that ran to completion
    pub completed: usize,

    /// Tasks whose callback panicked
    pub failed: usize,
}

/// Fixed-size worker pool executing submitted units of work.
///
/// The pool owns a dedicated multi-thread tokio runtime with exactly
/// `worker_count` threads, and runs `worker_count` workers on it that pull from
/// a central [`SchedulingQueue`]. Work is dispatched in submission order; with
/// more than one worker, completion order is unspecified.
///
/// # Thread Safety
/// - Submission is lock-free and safe from any thread
/// - An atomic flag controls shutdown behavior
/// - Shutdown happens once; later calls are no-ops
///
/// # Worker Behavior
/// 1. Gets a ready task from the SchedulingQueue
/// 2. Runs it under panic recovery
/// 3. Reports the outcome on the task's handle
pub struct WorkerPool {
    /// Size of the pool
    pool_size: usize,

    /// Dedicated runtime, taken on shutdown
    runtime: Mutex<Option<Runtime>>,

    /// Worker JoinHandles
    workers: Mutex<Vec<JoinHandle<()>>>,

    /// Per-worker status cells
    worker_statuses: Vec<Arc<AtomicUsize>>,

    /// Central scheduling queue for ready tasks
    scheduling_queue: Arc<SchedulingQueue>,

    /// Shutdown flag
    is_shutting_down: Arc<AtomicBool>,

    /// Current status of the pool
    status: AtomicUsize,

    /// Completion counters shared with the workers
    stats: Arc<WorkerStats>,

    /// Next task id
    next_id: AtomicU64,

    /// Configuration
    config: ExecutorConfig,
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("pool_size", &self.pool_size)
            .field("status", &self.status())
            .field("queue_length", &self.scheduling_queue.len())
            .finish()
    }
}

impl WorkerPool {
    /// Creates a pool and starts its workers.
    ///
    /// # Errors
    /// - [`AppliedError::InvalidArgument`] if the configuration is invalid
    /// - [`AppliedError::ThreadSetup`] if the runtime cannot be built
    pub fn new(config: ExecutorConfig) -> AppliedResult<Self> {
        config.validate()?;

        let prefix = config.thread_name_prefix.clone();
        let thread_counter = Arc::new(AtomicUsize::new(0));
        let runtime = Builder::new_multi_thread()
            .worker_threads(config.worker_count)
            .thread_name_fn(move || {
                let n = thread_counter.fetch_add(1, Ordering::Relaxed);
                format!("{}-{}", prefix, n)
            })
            .enable_all()
            .build()
            .map_err(|e| AppliedError::ThreadSetup(e.to_string()))?;

        let scheduling_queue = Arc::new(SchedulingQueue::new());
        let is_shutting_down = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(WorkerStats::default());

        let mut workers = Vec::with_capacity(config.worker_count);
        let mut worker_statuses = Vec::with_capacity(config.worker_count);
        for worker_id in 0..config.worker_count {
            let worker = Worker::new(
                worker_id,
                scheduling_queue.clone(),
                is_shutting_down.clone(),
                stats.clone(),
                config.idle_sleep_duration,
            );
            worker_statuses.push(worker.status());
            workers.push(worker.spawn(runtime.handle()));
        }

        info!(workers = config.worker_count, "worker pool started");

        Ok(Self {
            pool_size: config.worker_count,
            runtime: Mutex::new(Some(runtime)),
            workers: Mutex::new(workers),
            worker_statuses,
            scheduling_queue,
            is_shutting_down,
            status: AtomicUsize::new(SchedulerStatus::Running as usize),
            stats,
            next_id: AtomicU64::new(0),
            config,
        })
    }

    /// Queues `job` and returns a handle that completes when it has run.
    ///
    /// # Errors
    /// [`AppliedError::Closed`] once shutdown has begun.
    pub fn submit(&self, job: Task) -> AppliedResult<TaskHandle> {
        if self.is_shutting_down.load(Ordering::Acquire) {
            return Err(AppliedError::Closed);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (done, receiver) = flume::bounded(1);
        self.scheduling_queue.push(ScheduledTask { id, job, done });
        debug!(task = id, "task submitted");

        Ok(TaskHandle::new(id, receiver))
    }

    /// Stops the workers and releases the runtime.
    ///
    /// Tasks still queued are dropped and their handles report
    /// [`TaskError::Cancelled`](applied_api::errors::TaskError::Cancelled).
    /// Only the first call has any effect.
    pub fn shutdown(&self) {
        if self.is_shutting_down.swap(true, Ordering::AcqRel) {
            return;
        }
        self.status.store(SchedulerStatus::ShuttingDown as usize, Ordering::SeqCst);
        let _span = crate::pool_span!("shutdown", workers = self.pool_size).entered();

        // Wake every idle worker so it sees the flag
        self.scheduling_queue.notify_handle().notify_waiters();

        let runtime = self
            .runtime
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(runtime) = runtime {
            if Handle::try_current().is_ok() {
                // Blocking on shutdown is not allowed from inside a runtime.
                runtime.shutdown_background();
            } else {
                runtime.shutdown_timeout(self.config.shutdown_timeout);
            }
        }
        self.workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();

        let dropped = self.scheduling_queue.drain();
        if dropped > 0 {
            warn!(dropped, "tasks dropped at shutdown");
        }

        self.status.store(SchedulerStatus::Shutdown as usize, Ordering::SeqCst);
        info!("worker pool shut down");
    }

    /// Whether shutdown has begun
    pub fn is_shutting_down(&self) -> bool {
        self.is_shutting_down.load(Ordering::Acquire)
    }

    /// Get the pool size
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Get the current pool status
    pub fn status(&self) -> SchedulerStatus {
        match self.status.load(Ordering::Relaxed) {
            0 => SchedulerStatus::Running,
            1 => SchedulerStatus::ShuttingDown,
            _ => SchedulerStatus::Shutdown,
        }
    }

    /// Get metrics about the pool
    pub fn metrics(&self) -> PoolMetrics {
        let busy_workers = self
            .worker_statuses
            .iter()
            .filter(|s| s.load(Ordering::Relaxed) == WorkerStatus::Processing as usize)
            .count();

        PoolMetrics {
            pool_size: self.pool_size,
            queue_length: self.scheduling_queue.len(),
            busy_workers,
            is_shutting_down: self.is_shutting_down(),
            status: self.status(),
            completed: self.stats.completed.load(Ordering::Relaxed),
            failed: self.stats.failed.load(Ordering::Relaxed),
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
