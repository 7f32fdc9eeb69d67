// Applied: keyed coalescing executor and applied collections
//
// Every executor and collection in this crate owns a private worker pool and
// a ledger of the callbacks it has handed to that pool. Mutations return
// synchronously; callbacks run on the pool and are awaited only through
// `wait_for_consumers` or `close`.

pub mod collection;
pub mod config;
pub mod date;
pub mod demo;
pub mod demos;
pub mod host;
pub mod keyed;
pub mod logging;
pub mod scheduler;

// Re-export commonly used types
pub use collection::{AppliedList, AppliedQueue, AppliedSet};
pub use config::ExecutorConfig;
pub use demo::DemoRegistry;
pub use keyed::KeyedFunctionExecutor;
pub use applied_api_derive::*;

/// Everything needed to use the collections and the executor.
pub mod prelude {
    pub use applied_api::{Applied, AppliedError, AppliedResult, Container, TaskRunner};

    pub use crate::collection::{AppliedList, AppliedQueue, AppliedSet};
    pub use crate::config::ExecutorConfig;
    pub use crate::keyed::KeyedFunctionExecutor;
}
