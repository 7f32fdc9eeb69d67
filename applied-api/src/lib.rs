//! # Applied API
//!
//! Capability traits for containers whose mutations trigger asynchronous
//! callbacks, and for the task runners that execute those callbacks.
//!
//! ## Core Components
//!
//! - **Container**: the basic, thread-safe read/write contract of a backing container
//! - **TaskRunner**: fire-and-forget submission plus a blocking completion barrier
//! - **Applied**: mutation primitives that report their result synchronously and
//!   hand per-element callbacks to a runner
//! - **Demo**: runnable demos with derived name/version metadata
//!
//! ## Module Organization
//!
//! - [`applied`]: the and-apply capability
//! - [`container`]: the basic container contract
//! - [`runner`]: task submission and completion
//! - [`demo`]: demo traits
//! - [`errors`]: error types

pub mod applied;
pub mod container;
pub mod demo;
pub mod errors;
pub mod runner;

pub use applied::Applied;
pub use container::Container;
pub use demo::{Demo, DemoClass};
pub use errors::{AppliedError, AppliedResult, DemoError, TaskError};
pub use runner::{Task, TaskRunner};

// Re-export the derive macro
pub use applied_api_derive::DemoClass;
