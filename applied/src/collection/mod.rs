//! # Applied Collections
//!
//! Container decorators that pair a thread-safe backing container with a
//! private worker pool. Each decorator implements both
//! [`Container`](applied_api::Container), by delegation to its backing
//! container, and [`Applied`](applied_api::Applied), whose primitives hand
//! per-element callbacks to the pool.
//!
//! Decorators are never shared between pools: closing one (or dropping it)
//! waits for its own callbacks and releases its own workers.

pub mod backing;
mod list;
mod queue;
mod set;

pub use backing::{ConcurrentQueue, SyncList, SyncSet};
pub use list::AppliedList;
pub use queue::AppliedQueue;
pub use set::AppliedSet;
