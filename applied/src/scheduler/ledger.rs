use std::mem;
use std::sync::{Mutex, PoisonError};

use tracing::{debug, warn};

use applied_api::errors::TaskError;

use super::handle::TaskHandle;

/// Outcome counts of one [`Ledger::wait_all`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WaitSummary {
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl WaitSummary {
    /// Number of handles waited on.
    pub fn total(&self) -> usize {
        self.completed + self.failed + self.cancelled
    }
}

/// Outstanding task handles of one owner, in submission order.
///
/// A wait pass takes the current handles out under the lock and waits on
/// them without holding it, so submitters are never blocked by a waiter.
/// Handles recorded while a pass is running belong to the next pass.
#[derive(Debug, Default)]
pub struct Ledger {
    handles: Mutex<Vec<TaskHandle>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handle.
    pub fn record(&self, handle: TaskHandle) {
        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handle);
    }

    /// Number of handles recorded and not yet waited on.
    pub fn len(&self) -> usize {
        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Blocks until every handle recorded so far has finished, then forgets them.
    ///
    /// Failed and cancelled tasks are logged here, never returned to the caller.
    pub fn wait_all(&self) -> WaitSummary {
        let handles = mem::take(&mut *self.handles.lock().unwrap_or_else(PoisonError::into_inner));

        let mut summary = WaitSummary::default();
        for handle in handles {
            let id = handle.id();
            match handle.wait() {
                Ok(()) => summary.completed += 1,
                Err(TaskError::Panicked(message)) => {
                    debug!(task = id, error = %message, "task failure recorded");
                    summary.failed += 1;
                }
                Err(TaskError::Cancelled) => {
                    warn!(task = id, "task was cancelled before completion");
                    summary.cancelled += 1;
                }
            }
        }

        if summary.total() > 0 {
            crate::log_drain!("ledger", summary.total(), failed = summary.failed, cancelled = summary.cancelled);
        }
        summary
    }
}
