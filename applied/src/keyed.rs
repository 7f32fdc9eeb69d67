//! # Keyed Coalescing Executor
//!
//! Runs an action on the latest value submitted for a key. Values submitted
//! for a key while an earlier one is still waiting replace it, so a burst of
//! updates for one key collapses into as few action invocations as the
//! drainer manages to observe.
//!
//! ## Drain Protocol
//! 1. The value is stored in the pending map together with its action,
//!    replacing any earlier value for the key
//! 2. The caller tries, without blocking, to take the stripe lock of the key
//! 3. The holder takes every pending entry of its stripe out of the map and
//!    submits each entry's action, until no entry of the stripe is left
//! 4. After releasing the lock the holder checks the stripe again and repeats
//!    from step 2 if a value arrived in the meantime
//!
//! A caller that finds the stripe busy returns at once; the holder's loop, or
//! its re-check after release, picks the stored value up. Keys that share a
//! stripe are drained by whichever caller holds it, so no value is left in
//! the pending map once every `process` call has returned.
//!
//! ## Ordering
//! Actions submitted by one drain loop for one key are dispatched in the order
//! the loop took the values. With more than one worker they may complete in a
//! different order. Actions for different keys are unordered.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

use tracing::{trace, warn};

use applied_api::errors::{AppliedError, AppliedResult};
use applied_api::runner::TaskRunner;

use crate::config::ExecutorConfig;
use crate::scheduler::{Dispatcher, PoolMetrics, WaitSummary};

type Action<T> = Arc<dyn Fn(T) + Send + Sync>;

/// A stored value and the action supplied with it
struct Pending<T> {
    stripe: usize,
    value: T,
    action: Action<T>,
}

/// Executes an action on the most recent value for a key, collapsing values
/// that arrive while one is still pending.
///
/// # Examples
///
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use applied::KeyedFunctionExecutor;
///
/// let executor = KeyedFunctionExecutor::with_workers(2).unwrap();
/// let seen = Arc::new(Mutex::new(Vec::new()));
///
/// let sink = seen.clone();
/// executor
///     .process(move |v: String| sink.lock().unwrap().push(v), "k", "-1-".to_string())
///     .unwrap();
///
/// executor.close();
/// assert_eq!(*seen.lock().unwrap(), vec!["-1-".to_string()]);
/// ```
pub struct KeyedFunctionExecutor<T> {
    /// Latest undrained value per key
    pending: Mutex<HashMap<String, Pending<T>>>,

    /// Drain locks, selected by key hash
    stripes: Box<[Mutex<()>]>,

    /// Pool and ledger the actions run on
    dispatcher: Dispatcher,
}

impl<T> fmt::Debug for KeyedFunctionExecutor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedFunctionExecutor")
            .field("pending", &self.pending_len())
            .field("stripes", &self.stripes.len())
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

impl<T> KeyedFunctionExecutor<T>
where
    T: Send + 'static,
{
    /// Executor with one worker per available CPU.
    pub fn new() -> AppliedResult<Self> {
        Self::with_config(ExecutorConfig::default())
    }

    /// Executor with `worker_count` workers.
    ///
    /// # Errors
    /// [`AppliedError::InvalidArgument`] if `worker_count` is zero.
    pub fn with_workers(worker_count: usize) -> AppliedResult<Self> {
        Self::with_config(ExecutorConfig::with_workers(worker_count))
    }

    pub fn with_config(config: ExecutorConfig) -> AppliedResult<Self> {
        config.validate()?;
        let stripes = (0..config.stripe_count).map(|_| Mutex::new(())).collect();
        Ok(Self {
            pending: Mutex::new(HashMap::new()),
            stripes,
            dispatcher: Dispatcher::new(config)?,
        })
    }

    /// Stores `value` as the pending value for `key` and, unless another
    /// thread is already draining the key's stripe, drains it.
    ///
    /// Returns without blocking on the action. A busy stripe is not an error.
    ///
    /// # Errors
    /// - [`AppliedError::NullReference`] if `key` is empty
    /// - [`AppliedError::Closed`] after [`close`](Self::close)
    pub fn process<F>(&self, action: F, key: &str, value: T) -> AppliedResult<()>
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        if key.is_empty() {
            return Err(AppliedError::NullReference("key"));
        }
        if self.dispatcher.is_closed() {
            return Err(AppliedError::Closed);
        }

        let stripe = self.stripe_index(key);
        let action: Action<T> = Arc::new(action);
        self.lock_pending()
            .insert(key.to_string(), Pending { stripe, value, action });

        self.drain_stripe(key, stripe, || {})
    }

    /// Drains `stripe` for as long as this thread can hold its lock and
    /// values keep arriving. `before_release` runs after each drain pass,
    /// while the lock is still held.
    fn drain_stripe<H>(&self, key: &str, stripe: usize, mut before_release: H) -> AppliedResult<()>
    where
        H: FnMut(),
    {
        let lock = &self.stripes[stripe];
        loop {
            let guard = match lock.try_lock() {
                Ok(guard) => guard,
                Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
                Err(TryLockError::WouldBlock) => {
                    warn!(key, stripe, "stripe busy, leaving value to the current drainer");
                    return Ok(());
                }
            };

            let drained = self.drain(stripe);
            before_release();
            drop(guard);
            let drained = drained?;
            crate::log_drain!(key, drained, stripe = stripe);

            // A value stored between the last take and the release would
            // otherwise wait for the next call on this stripe.
            if !self.stripe_has_pending(stripe) {
                return Ok(());
            }
            trace!(key, stripe, "value arrived during release, draining again");
        }
    }

    /// Blocks until every action submitted so far has finished.
    pub fn wait_for_consumers(&self) -> WaitSummary {
        self.dispatcher.wait_all()
    }

    pub fn metrics(&self) -> PoolMetrics {
        self.dispatcher.metrics()
    }

    /// Waits for every submitted action, then shuts the pool down. Idempotent.
    pub fn close(&self) {
        self.dispatcher.close();
    }

    pub fn is_closed(&self) -> bool {
        self.dispatcher.is_closed()
    }

    /// Takes the stripe's entries until none is left, submitting each
    /// entry's action with its value.
    fn drain(&self, stripe: usize) -> AppliedResult<usize> {
        let mut drained = 0;
        loop {
            // Bind first so the map lock is released before submitting
            let taken = self.take_stripe(stripe);
            if taken.is_empty() {
                return Ok(drained);
            }
            for Pending { value, action, .. } in taken {
                self.dispatcher.run_task(Box::new(move || action(value)))?;
                drained += 1;
            }
        }
    }
}

impl<T> KeyedFunctionExecutor<T> {
    /// Whether a value for `key` is waiting to be drained.
    pub fn is_pending(&self, key: &str) -> bool {
        self.lock_pending().contains_key(key)
    }

    /// Number of keys with a value waiting to be drained.
    pub fn pending_len(&self) -> usize {
        self.lock_pending().len()
    }

    fn stripe_has_pending(&self, stripe: usize) -> bool {
        self.lock_pending().values().any(|entry| entry.stripe == stripe)
    }

    fn take_stripe(&self, stripe: usize) -> Vec<Pending<T>> {
        let mut pending = self.lock_pending();
        let keys: Vec<String> = pending
            .iter()
            .filter(|(_, entry)| entry.stripe == stripe)
            .map(|(key, _)| key.clone())
            .collect();
        keys.iter().filter_map(|key| pending.remove(key)).collect()
    }

    fn stripe_index(&self, key: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.stripes.len() as u64) as usize
    }

    fn lock_pending(&self) -> MutexGuard<'_, HashMap<String, Pending<T>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn recorder(seen: &Arc<Mutex<Vec<u32>>>) -> impl Fn(u32) + Send + Sync + 'static {
        let sink = seen.clone();
        move |v| sink.lock().unwrap().push(v)
    }

    #[test]
    fn test_single_value_is_delivered() {
        let executor = KeyedFunctionExecutor::with_workers(2).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        executor
            .process(move |v: String| sink.lock().unwrap().push(v), "k", "-1-".to_string())
            .unwrap();
        executor.close();

        assert_eq!(*seen.lock().unwrap(), vec!["-1-".to_string()]);
        assert_eq!(executor.pending_len(), 0);
    }

    #[test]
    fn test_empty_key_rejected() {
        let executor = KeyedFunctionExecutor::with_workers(1).unwrap();
        let result = executor.process(|_: u32| {}, "", 1);
        assert_eq!(result, Err(AppliedError::NullReference("key")));
        assert_eq!(executor.pending_len(), 0);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let result = KeyedFunctionExecutor::<u32>::with_workers(0);
        assert!(matches!(result, Err(AppliedError::InvalidArgument(_))));
    }

    #[test]
    fn test_process_after_close() {
        let executor = KeyedFunctionExecutor::with_workers(1).unwrap();
        executor.close();
        assert_eq!(executor.process(|_: u32| {}, "k", 1), Err(AppliedError::Closed));
    }

    #[test]
    fn test_stripe_index_is_stable() {
        let executor = KeyedFunctionExecutor::<u32>::with_workers(1).unwrap();
        let first = executor.stripe_index("order-17");
        assert_eq!(executor.stripe_index("order-17"), first);
        assert!(first < executor.stripes.len());
    }

    #[test]
    fn test_busy_stripe_leaves_value_pending() {
        let executor = KeyedFunctionExecutor::with_workers(1).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));

        let stripe = &executor.stripes[executor.stripe_index("k")];
        let guard = stripe.lock().unwrap();
        let counter = calls.clone();
        executor
            .process(move |_: u32| { counter.fetch_add(1, Ordering::SeqCst); }, "k", 1)
            .unwrap();
        assert!(executor.is_pending("k"));
        drop(guard);

        // The next call on the key drains the latest value only
        let counter = calls.clone();
        executor
            .process(move |_: u32| { counter.fetch_add(1, Ordering::SeqCst); }, "k", 2)
            .unwrap();
        executor.close();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!executor.is_pending("k"));
    }

    #[test]
    fn test_debug_output() {
        let executor = KeyedFunctionExecutor::<u32>::with_workers(1).unwrap();
        let rendered = format!("{:?}", executor);
        assert!(rendered.starts_with("KeyedFunctionExecutor"));
        assert!(rendered.contains("pending: 0"));
    }

    // A value left behind on a busy stripe is drained by the next caller of
    // any key mapped to that stripe
    #[test]
    fn test_shared_stripe_drained_by_other_key() {
        let config = ExecutorConfig {
            stripe_count: 1,
            ..ExecutorConfig::with_workers(1)
        };
        let executor = KeyedFunctionExecutor::with_config(config).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let guard = executor.stripes[0].lock().unwrap();
        executor.process(recorder(&seen), "b", 1).unwrap();
        assert!(executor.is_pending("b"));
        drop(guard);

        executor.process(recorder(&seen), "a", 2).unwrap();
        assert!(!executor.is_pending("b"));
        assert_eq!(executor.pending_len(), 0);
        executor.close();

        let mut delivered = seen.lock().unwrap().clone();
        delivered.sort();
        assert_eq!(delivered, vec![1, 2]);
    }

    // A value stored after the last take but before the lock is released
    // is picked up by the re-check
    #[test]
    fn test_value_arriving_before_release_is_drained() {
        let executor = KeyedFunctionExecutor::with_workers(1).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        executor.process(recorder(&seen), "k", 1).unwrap();

        let stripe = executor.stripe_index("k");
        let mut late = Some(2);
        executor
            .drain_stripe("k", stripe, || {
                if let Some(value) = late.take() {
                    executor.process(recorder(&seen), "k", value).unwrap();
                    assert!(executor.is_pending("k"));
                }
            })
            .unwrap();

        assert!(late.is_none());
        assert_eq!(executor.pending_len(), 0);
        executor.close();
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }
}
