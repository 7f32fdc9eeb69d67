use std::fmt;

use tracing::trace;

use applied_api::applied::Applied;
use applied_api::container::Container;
use applied_api::errors::AppliedResult;
use applied_api::runner::TaskRunner;

use super::backing::SyncList;
use crate::config::ExecutorConfig;
use crate::scheduler::{Dispatcher, PoolMetrics};

/// An indexed list whose removals can hand the removed element to a callback
/// running on the list's own worker pool.
///
/// Index-based operations fail with
/// [`AppliedError::IndexOutOfRange`](applied_api::errors::AppliedError::IndexOutOfRange)
/// for positions outside the list, without mutating it.
pub struct AppliedList<T> {
    list: SyncList<T>,
    dispatcher: Dispatcher,
}

impl<T: fmt::Debug> fmt::Debug for AppliedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppliedList")
            .field("list", &self.list)
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

impl<T> AppliedList<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new() -> AppliedResult<Self> {
        Self::with_config(ExecutorConfig::default())
    }

    pub fn with_workers(worker_count: usize) -> AppliedResult<Self> {
        Self::with_config(ExecutorConfig::with_workers(worker_count))
    }

    pub fn with_config(config: ExecutorConfig) -> AppliedResult<Self> {
        Self::from_backing(SyncList::new(), config)
    }

    /// Immutable list holding up to three values, in order.
    pub fn of<const N: usize>(values: [T; N]) -> AppliedResult<Self> {
        const { assert!(N <= 3, "an immutable applied list holds at most three elements") };
        Self::from_backing(SyncList::frozen(values), ExecutorConfig::default())
    }

    fn from_backing(list: SyncList<T>, config: ExecutorConfig) -> AppliedResult<Self> {
        Ok(Self {
            list,
            dispatcher: Dispatcher::new(config)?,
        })
    }

    pub fn is_immutable(&self) -> bool {
        self.list.is_frozen()
    }

    /// Copy of the element at `index`.
    pub fn get(&self, index: usize) -> AppliedResult<T> {
        self.list.get(index)
    }

    /// Inserts `value` at `index`, shifting later elements right. `index` may
    /// equal the length.
    pub fn insert(&self, index: usize, value: T) -> AppliedResult<()> {
        self.list.insert(index, value)
    }

    /// Position of the first occurrence of `value`.
    pub fn index_of(&self, value: &T) -> Option<usize> {
        self.list.index_of(value)
    }

    /// Removes the first occurrence of `value` and, if there was one,
    /// schedules `consumer` for it.
    pub fn remove_and_apply<C>(&self, value: &T, consumer: C) -> AppliedResult<bool>
    where
        C: FnOnce(T) + Send + 'static,
    {
        trace!("remove_and_apply");
        if !self.list.remove(value)? {
            return Ok(false);
        }
        let value = value.clone();
        self.run_task(move || consumer(value))?;
        Ok(true)
    }

    /// Removes the element at `index` and schedules `consumer` for it.
    pub fn remove_at_and_apply<C>(&self, index: usize, consumer: C) -> AppliedResult<T>
    where
        C: FnOnce(T) + Send + 'static,
    {
        trace!(index, "remove_at_and_apply");
        let removed = self.list.remove_at(index)?;
        let element = removed.clone();
        self.run_task(move || consumer(element))?;
        Ok(removed)
    }

    /// [`remove_and_apply`](Self::remove_and_apply), but only if `matcher`
    /// holds for `value`.
    pub fn remove_if_and_apply<P, C>(&self, value: &T, matcher: P, consumer: C) -> AppliedResult<bool>
    where
        P: FnOnce(&T) -> bool,
        C: FnOnce(T) + Send + 'static,
    {
        if matcher(value) {
            self.remove_and_apply(value, consumer)
        } else {
            Ok(false)
        }
    }

    /// Removes the element at `index` if `matcher` holds for it and schedules
    /// `consumer` for the removed element. Returns the removed element.
    pub fn remove_at_if_and_apply<P, C>(&self, index: usize, matcher: P, consumer: C) -> AppliedResult<Option<T>>
    where
        P: FnOnce(&T) -> bool,
        C: FnOnce(T) + Send + 'static,
    {
        trace!(index, "remove_at_if_and_apply");
        let removed = self.list.remove_at_if(index, matcher)?;
        if let Some(element) = &removed {
            let element = element.clone();
            self.run_task(move || consumer(element))?;
        }
        Ok(removed)
    }

    pub fn metrics(&self) -> PoolMetrics {
        self.dispatcher.metrics()
    }
}

impl<T> Container<T> for AppliedList<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn len(&self) -> usize {
        self.list.len()
    }

    fn contains(&self, value: &T) -> bool {
        self.list.contains(value)
    }

    fn to_vec(&self) -> Vec<T> {
        self.list.to_vec()
    }

    fn add(&self, value: T) -> AppliedResult<bool> {
        self.list.add(value)
    }

    fn remove(&self, value: &T) -> AppliedResult<bool> {
        self.list.remove(value)
    }

    fn clear(&self) -> AppliedResult<()> {
        self.list.clear()
    }

    fn take_all(&self) -> AppliedResult<Vec<T>> {
        self.list.take_all()
    }

    fn retain_split(&self, values: &[T]) -> AppliedResult<(Vec<T>, Vec<T>)> {
        self.list.retain_split(values)
    }
}

impl<T> Applied<T> for AppliedList<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    type Backing = SyncList<T>;

    fn backing(&self) -> &Self::Backing {
        &self.list
    }

    fn runner(&self) -> &dyn TaskRunner {
        &self.dispatcher
    }
}
