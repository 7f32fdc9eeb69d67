use std::time::Duration;

use applied_api::errors::{AppliedError, AppliedResult};

/// Number of stripe locks used by the keyed executor when not configured.
pub const DEFAULT_STRIPE_COUNT: usize = 64;

/// Name prefix given to worker threads.
pub const DEFAULT_THREAD_NAME_PREFIX: &str = "applied-worker";

// --- Executor Configuration ---

/// Configuration for a worker pool and the component that owns it.
///
/// Every executor and applied collection owns exactly one pool built from one of
/// these; pools are never shared between instances.
#[derive(Clone, Debug)]
pub struct ExecutorConfig {
    /// The number of worker threads in the pool.
    pub worker_count: usize,

    /// How long an idle worker sleeps before re-checking the queue and the
    /// shutdown flag when no wakeup arrives.
    pub idle_sleep_duration: Duration,

    /// How long shutdown waits for worker threads to exit.
    pub shutdown_timeout: Duration,

    /// The number of stripe locks guarding keyed drains.
    pub stripe_count: usize,

    /// Prefix for worker thread names.
    pub thread_name_prefix: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            worker_count: num_cpus::get(),
            idle_sleep_duration: Duration::from_millis(10),
            shutdown_timeout: Duration::from_secs(10),
            stripe_count: DEFAULT_STRIPE_COUNT,
            thread_name_prefix: DEFAULT_THREAD_NAME_PREFIX.to_string(),
        }
    }
}

impl ExecutorConfig {
    /// Default configuration with an explicit worker count.
    pub fn with_workers(worker_count: usize) -> Self {
        Self {
            worker_count,
            ..Default::default()
        }
    }

    /// Rejects configurations no pool can be built from.
    pub fn validate(&self) -> AppliedResult<()> {
        if self.worker_count == 0 {
            return Err(AppliedError::InvalidArgument(
                "Number of threads must be greater than 0".to_string(),
            ));
        }
        if self.stripe_count == 0 {
            return Err(AppliedError::InvalidArgument(
                "Number of stripes must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExecutorConfig::default();

        assert_eq!(config.worker_count, num_cpus::get());
        assert_eq!(config.stripe_count, DEFAULT_STRIPE_COUNT);
        assert_eq!(config.idle_sleep_duration, Duration::from_millis(10));
        assert_eq!(config.thread_name_prefix, "applied-worker");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config = ExecutorConfig::with_workers(0);
        assert!(matches!(config.validate(), Err(AppliedError::InvalidArgument(_))));
    }

    #[test]
    fn test_zero_stripes_rejected() {
        let config = ExecutorConfig {
            stripe_count: 0,
            ..ExecutorConfig::with_workers(2)
        };
        assert!(matches!(config.validate(), Err(AppliedError::InvalidArgument(_))));
    }

    #[test]
    fn test_config_debug_format() {
        let config = ExecutorConfig::with_workers(3);
        assert!(format!("{:?}", config).contains("worker_count: 3"));
    }
}
