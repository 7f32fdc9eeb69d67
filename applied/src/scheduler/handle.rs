use std::fmt;

use applied_api::errors::TaskError;

/// Handle to a unit of work submitted to a [`WorkerPool`](super::WorkerPool).
///
/// Created at submission, consumed by [`wait`](TaskHandle::wait). Dropping a
/// handle does not cancel the work.
pub struct TaskHandle {
    id: u64,
    done: flume::Receiver<Result<(), TaskError>>,
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id)
            .field("finished", &self.is_finished())
            .finish()
    }
}

impl TaskHandle {
    pub(crate) fn new(id: u64, done: flume::Receiver<Result<(), TaskError>>) -> Self {
        Self { id, done }
    }

    /// Pool-unique id of the task.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether the task has finished, failed, or been dropped unrun.
    pub fn is_finished(&self) -> bool {
        !self.done.is_empty() || self.done.is_disconnected()
    }

    /// Blocks until the task finishes.
    ///
    /// Returns [`TaskError::Panicked`] if the callback panicked and
    /// [`TaskError::Cancelled`] if the task was dropped before it ran.
    pub fn wait(self) -> Result<(), TaskError> {
        match self.done.recv() {
            Ok(outcome) => outcome,
            Err(flume::RecvError::Disconnected) => Err(TaskError::Cancelled),
        }
    }
}
