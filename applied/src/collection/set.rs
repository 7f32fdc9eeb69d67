use std::fmt;
use std::hash::Hash;

use tracing::trace;

use applied_api::applied::Applied;
use applied_api::container::Container;
use applied_api::errors::AppliedResult;
use applied_api::runner::TaskRunner;

use super::backing::SyncSet;
use crate::config::ExecutorConfig;
use crate::scheduler::{Dispatcher, PoolMetrics};

/// A hash set whose removals can hand the removed value to a callback running
/// on the set's own worker pool.
///
/// [`AppliedSet::of`] builds an immutable set of up to three elements; every
/// mutation of it fails with
/// [`AppliedError::Unsupported`](applied_api::errors::AppliedError::Unsupported).
pub struct AppliedSet<T> {
    set: SyncSet<T>,
    dispatcher: Dispatcher,
}

impl<T: fmt::Debug> fmt::Debug for AppliedSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppliedSet")
            .field("set", &self.set)
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

impl<T> AppliedSet<T>
where
    T: Clone + Eq + Hash + Send + Sync + 'static,
{
    /// Empty set with one worker per available CPU.
    pub fn new() -> AppliedResult<Self> {
        Self::with_config(ExecutorConfig::default())
    }

    /// Empty set with `worker_count` workers.
    pub fn with_workers(worker_count: usize) -> AppliedResult<Self> {
        Self::with_config(ExecutorConfig::with_workers(worker_count))
    }

    pub fn with_config(config: ExecutorConfig) -> AppliedResult<Self> {
        Self::from_backing(SyncSet::new(), config)
    }

    /// Immutable set holding up to three values. Duplicates collapse.
    ///
    /// ```rust
    /// use applied::prelude::*;
    ///
    /// let set = AppliedSet::of(["a", "b", "a"]).unwrap();
    /// assert_eq!(set.len(), 2);
    /// assert!(set.add("c").is_err());
    /// ```
    pub fn of<const N: usize>(values: [T; N]) -> AppliedResult<Self> {
        const { assert!(N <= 3, "an immutable applied set holds at most three elements") };
        Self::from_backing(SyncSet::frozen(values), ExecutorConfig::default())
    }

    fn from_backing(set: SyncSet<T>, config: ExecutorConfig) -> AppliedResult<Self> {
        Ok(Self {
            set,
            dispatcher: Dispatcher::new(config)?,
        })
    }

    /// Whether this set rejects mutation.
    pub fn is_immutable(&self) -> bool {
        self.set.is_frozen()
    }

    /// Removes `value` and schedules `consumer` for it.
    ///
    /// The callback fires whether or not the value was present; the result
    /// reports whether it was.
    pub fn remove_and_apply<C>(&self, value: T, consumer: C) -> AppliedResult<bool>
    where
        C: FnOnce(T) + Send + 'static,
    {
        trace!("remove_and_apply");
        let removed = self.set.remove(&value)?;
        self.run_task(move || consumer(value))?;
        Ok(removed)
    }

    /// [`remove_and_apply`](Self::remove_and_apply), but only if `matcher`
    /// holds for `value`. Nothing is removed or scheduled otherwise.
    pub fn remove_if_and_apply<P, C>(&self, value: T, matcher: P, consumer: C) -> AppliedResult<bool>
    where
        P: FnOnce(&T) -> bool,
        C: FnOnce(T) + Send + 'static,
    {
        if matcher(&value) {
            self.remove_and_apply(value, consumer)
        } else {
            Ok(false)
        }
    }

    pub fn metrics(&self) -> PoolMetrics {
        self.dispatcher.metrics()
    }
}

impl<T> Container<T> for AppliedSet<T>
where
    T: Clone + Eq + Hash + Send + Sync + 'static,
{
    fn len(&self) -> usize {
        self.set.len()
    }

    fn contains(&self, value: &T) -> bool {
        self.set.contains(value)
    }

    fn to_vec(&self) -> Vec<T> {
        self.set.to_vec()
    }

    fn add(&self, value: T) -> AppliedResult<bool> {
        self.set.add(value)
    }

    fn remove(&self, value: &T) -> AppliedResult<bool> {
        self.set.remove(value)
    }

    fn clear(&self) -> AppliedResult<()> {
        self.set.clear()
    }

    fn take_all(&self) -> AppliedResult<Vec<T>> {
        self.set.take_all()
    }

    fn retain_split(&self, values: &[T]) -> AppliedResult<(Vec<T>, Vec<T>)> {
        self.set.retain_split(values)
    }
}

impl<T> Applied<T> for AppliedSet<T>
where
    T: Clone + Eq + Hash + Send + Sync + 'static,
{
    type Backing = SyncSet<T>;

    fn backing(&self) -> &Self::Backing {
        &self.set
    }

    fn runner(&self) -> &dyn TaskRunner {
        &self.dispatcher
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use applied_api::errors::AppliedError;

    #[test]
    fn test_remove_and_apply_reports_presence() {
        let set = AppliedSet::with_workers(2).unwrap();
        set.add_all([1, 2, 3]).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        assert!(set.remove_and_apply(2, move |v| sink.lock().unwrap().push(v)).unwrap());
        let sink = seen.clone();
        assert!(!set.remove_and_apply(9, move |v| sink.lock().unwrap().push(v)).unwrap());
        set.close();

        let mut seen = seen.lock().unwrap().clone();
        seen.sort();
        assert_eq!(seen, vec![2, 9]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_remove_if_and_apply_respects_matcher() {
        let set = AppliedSet::with_workers(1).unwrap();
        set.add_all(["a", "b"]).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        assert!(!set.remove_if_and_apply("a", |v| *v == "b", move |v| sink.lock().unwrap().push(v)).unwrap());
        let sink = seen.clone();
        assert!(set.remove_if_and_apply("b", |v| *v == "b", move |v| sink.lock().unwrap().push(v)).unwrap());
        set.close();

        assert_eq!(*seen.lock().unwrap(), vec!["b"]);
        assert_eq!(set.to_vec(), vec!["a"]);
    }

    #[test]
    fn test_of_is_immutable() {
        let empty = AppliedSet::<u8>::of([]).unwrap();
        assert!(empty.is_empty());
        assert!(empty.is_immutable());

        let set = AppliedSet::of([1, 2, 3]).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.add(4), Err(AppliedError::Unsupported("set is immutable".to_string())));
        assert!(matches!(set.remove_and_apply(1, |_| {}), Err(AppliedError::Unsupported(_))));
        assert!(matches!(set.clear_and_apply(|_| {}, || {}), Err(AppliedError::Unsupported(_))));
        assert_eq!(set.len(), 3);
    }
}
