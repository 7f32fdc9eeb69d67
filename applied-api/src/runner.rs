//! # Task Runner
//!
//! The seam between the applied capability and the worker pool that executes
//! callbacks. A runner accepts fire-and-forget units of work, tracks them in a
//! completion ledger and offers a blocking barrier over everything it has
//! accepted so far.

use crate::errors::AppliedResult;

/// A unit of work executed on a worker.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Submits units of work and waits for them.
pub trait TaskRunner: Send + Sync {
    /// Schedules `task` for asynchronous execution and records its handle.
    ///
    /// Returns immediately. Fails with
    /// [`AppliedError::Closed`](crate::errors::AppliedError::Closed) once the
    /// runner has been closed.
    fn run_task(&self, task: Task) -> AppliedResult<()>;

    /// Blocks until every unit of work recorded so far has finished, then
    /// forgets them. Work recorded by other threads while this call is waiting
    /// is only guaranteed to be covered by a later call.
    fn wait_for_consumers(&self);

    /// Waits for outstanding work and releases the workers. Idempotent.
    fn close(&self);

    /// Whether [`close`](TaskRunner::close) has been called.
    fn is_closed(&self) -> bool;
}
