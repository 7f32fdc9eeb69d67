use std::fmt;
use std::sync::Arc;

use crossbeam_queue::SegQueue;
use tokio::sync::Notify;

use applied_api::errors::TaskError;
use applied_api::runner::Task;

/// A unit of work waiting for a worker, together with the channel its
/// completion is reported on.
pub(crate) struct ScheduledTask {
    /// Pool-unique task id, used in logs
    pub id: u64,
    /// The work itself
    pub job: Task,
    /// Completion channel read by the task's handle
    pub done: flume::Sender<Result<(), TaskError>>,
}

impl fmt::Debug for ScheduledTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledTask").field("id", &self.id).finish()
    }
}

/// A queue of units of work that are ready to run.
///
/// Producers push from any thread; the pool's workers pull from it.
///
/// # Thread Safety
/// - Uses a lock-free queue internally (SegQueue)
/// - Safe for concurrent producers and consumers
/// - Uses Notify for worker wakeup
///
/// # Ordering
/// FIFO: tasks are handed to workers in the order they were pushed.
pub(crate) struct SchedulingQueue {
    /// Lock-free queue holding ready tasks
    queue: SegQueue<ScheduledTask>,

    /// Notification mechanism to wake up workers when the queue has items
    notify: Arc<Notify>,
}

impl fmt::Debug for SchedulingQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulingQueue")
            .field("len", &self.queue.len())
            .finish()
    }
}

impl SchedulingQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            queue: SegQueue::new(),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Pushes a task and wakes one waiting worker.
    pub fn push(&self, task: ScheduledTask) {
        self.queue.push(task);
        self.notify.notify_one();
    }

    /// Tries to pop a task without waiting.
    pub fn try_pop(&self) -> Option<ScheduledTask> {
        self.queue.pop()
    }

    /// Number of tasks currently queued.
    ///
    /// This is a snapshot and may change by the time the value is used.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Gets a clone of the notification mechanism for workers to wait on.
    pub fn notify_handle(&self) -> Arc<Notify> {
        self.notify.clone()
    }

    /// Removes every queued task without running it.
    ///
    /// Dropping a task drops its completion sender, so its handle reports
    /// the task as cancelled.
    pub fn drain(&self) -> usize {
        let mut dropped = 0;
        while self.queue.pop().is_some() {
            dropped += 1;
        }
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: u64) -> (ScheduledTask, flume::Receiver<Result<(), TaskError>>) {
        let (done, rx) = flume::bounded(1);
        (
            ScheduledTask {
                id,
                job: Box::new(|| {}),
                done,
            },
            rx,
        )
    }

    #[test]
    fn test_fifo_order() {
        let queue = SchedulingQueue::new();
        let (first, _rx1) = task(1);
        let (second, _rx2) = task(2);

        queue.push(first);
        queue.push(second);

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.try_pop().map(|t| t.id), Some(1));
        assert_eq!(queue.try_pop().map(|t| t.id), Some(2));
        assert!(queue.try_pop().is_none());
    }

    #[test]
    fn test_drain_disconnects_handles() {
        let queue = SchedulingQueue::new();
        let (queued, rx) = task(7);
        queue.push(queued);

        assert_eq!(queue.drain(), 1);
        assert_eq!(queue.len(), 0);
        assert!(rx.recv().is_err());
    }
}
