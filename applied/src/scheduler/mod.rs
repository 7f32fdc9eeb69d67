//! # Scheduler Module
//!
//! The worker pool that runs callbacks, and the bookkeeping around it.
//!
//! ## Key Concepts
//! - Worker pool: a fixed number of workers on a dedicated runtime
//! - Scheduling queue: lock-free FIFO of ready units of work
//! - Ledger: the handles of everything an owner has submitted and not yet waited on
//! - Dispatcher: one pool plus one ledger, the runner behind every executor and collection

mod dispatcher;
mod handle;
mod ledger;
mod pool;
mod queue;
mod worker;

pub use dispatcher::Dispatcher;
pub use handle::TaskHandle;
pub use ledger::{Ledger, WaitSummary};
pub use pool::{PoolMetrics, SchedulerStatus, WorkerPool};
pub use worker::WorkerStatus;
