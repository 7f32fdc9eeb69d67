use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use applied_api::errors::{AppliedError, AppliedResult};
use applied_api::runner::{Task, TaskRunner};

use super::ledger::{Ledger, WaitSummary};
use super::pool::{PoolMetrics, WorkerPool};
use crate::config::ExecutorConfig;

/// A worker pool paired with the ledger of the work submitted to it.
///
/// Each executor and applied collection owns exactly one dispatcher. Closing
/// waits for everything recorded, then shuts the pool down; dropping an open
/// dispatcher closes it.
pub struct Dispatcher {
    pool: WorkerPool,
    ledger: Ledger,
    closed: AtomicBool,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("pool", &self.pool)
            .field("outstanding", &self.ledger.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Dispatcher {
    pub fn new(config: ExecutorConfig) -> AppliedResult<Self> {
        Ok(Self {
            pool: WorkerPool::new(config)?,
            ledger: Ledger::new(),
            closed: AtomicBool::new(false),
        })
    }

    /// Waits for every recorded task and reports how they ended.
    pub fn wait_all(&self) -> WaitSummary {
        self.ledger.wait_all()
    }

    /// Number of recorded tasks not yet waited on.
    pub fn outstanding(&self) -> usize {
        self.ledger.len()
    }

    pub fn metrics(&self) -> PoolMetrics {
        self.pool.metrics()
    }
}

impl TaskRunner for Dispatcher {
    fn run_task(&self, task: Task) -> AppliedResult<()> {
        if self.is_closed() {
            return Err(AppliedError::Closed);
        }
        let handle = self.pool.submit(task)?;
        self.ledger.record(handle);
        Ok(())
    }

    fn wait_for_consumers(&self) {
        self.ledger.wait_all();
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let summary = self.ledger.wait_all();
        debug!(
            completed = summary.completed,
            failed = summary.failed,
            cancelled = summary.cancelled,
            "dispatcher closing"
        );
        self.pool.shutdown();
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_close_waits_for_recorded_work() {
        let dispatcher = Dispatcher::new(ExecutorConfig::with_workers(2)).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..20 {
            let counter = counter.clone();
            dispatcher
                .run_task(Box::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }))
                .unwrap();
        }

        dispatcher.close();
        assert_eq!(counter.load(Ordering::SeqCst), 20);
        assert_eq!(dispatcher.outstanding(), 0);
        assert!(dispatcher.is_closed());
    }

    #[test]
    fn test_run_task_after_close() {
        let dispatcher = Dispatcher::new(ExecutorConfig::with_workers(1)).unwrap();
        dispatcher.close();
        dispatcher.close();

        let result = dispatcher.run_task(Box::new(|| {}));
        assert_eq!(result, Err(AppliedError::Closed));
    }

    #[test]
    fn test_wait_all_reports_panics() {
        let dispatcher = Dispatcher::new(ExecutorConfig::with_workers(1)).unwrap();
        dispatcher.run_task(Box::new(|| panic!("bad element"))).unwrap();
        dispatcher.run_task(Box::new(|| {})).unwrap();

        let summary = dispatcher.wait_all();
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.failed, 1);
    }
}
