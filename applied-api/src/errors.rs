//! # Error Types
//!
//! Errors surfaced to callers of executors and applied collections.
//!
//! ## Propagation Policy
//!
//! - Synchronous, caller-facing failures (bad arguments, empty-container access,
//!   mutation of an immutable container) are returned as [`AppliedError`] from the
//!   call that caused them, with no state mutated.
//! - Failures inside asynchronously executed callbacks are never returned to the
//!   caller of a mutation. They are described by [`TaskError`] and reported at the
//!   worker boundary.
//!
//! ## Usage Example
//!
//! ```rust
//! use applied_api::errors::AppliedError;
//!
//! fn describe(error: &AppliedError) -> &'static str {
//!     match error {
//!         AppliedError::InvalidArgument(_) => "bad configuration",
//!         AppliedError::NotFound => "container was empty",
//!         AppliedError::IndexOutOfRange { .. } => "index outside the list",
//!         _ => "other",
//!     }
//! }
//! ```

use thiserror::Error;

/// Core error type for executors and applied collections.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppliedError {
    /// A constructor or operation argument is outside its allowed range,
    /// such as a worker count of zero.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A required argument was missing or empty.
    ///
    /// References cannot be null, so this covers identities such as an
    /// empty key that carry no value.
    #[error("Required argument is missing: {0}")]
    NullReference(&'static str),

    /// A head-retrieval operation required an element and the container was empty.
    #[error("No such element")]
    NotFound,

    /// An index-based operation addressed a position outside the container.
    #[error("Index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// The container is immutable.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Work was submitted after the owning executor or collection was closed.
    #[error("Executor is closed")]
    Closed,

    /// The worker pool could not be started.
    #[error("Thread setup error: {0}")]
    ThreadSetup(String),
}

/// Outcome of a unit of work that did not complete normally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The callback panicked while running on a worker.
    #[error("Task panicked: {0}")]
    Panicked(String),

    /// The unit of work was dropped before it ran, for example because the
    /// pool was torn down underneath it.
    #[error("Task was cancelled before completion")]
    Cancelled,
}

/// Errors raised while locating or running a demo.
#[derive(Error, Debug)]
pub enum DemoError {
    /// No demo is registered under the given name.
    #[error("Demo not found: {0}")]
    NotFound(String),

    /// The demo ran and reported a failure.
    #[error("Demo {name} failed: {source}")]
    Failed {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Result alias used across the applied API.
pub type AppliedResult<T> = Result<T, AppliedError>;
