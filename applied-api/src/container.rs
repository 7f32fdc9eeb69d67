//! # Basic Container Contract
//!
//! The read/write contract every backing container offers. Applied decorators
//! implement it by direct delegation to the container they own, and the
//! [`Applied`](crate::applied::Applied) capability is layered on top of it.
//!
//! Implementations are responsible for their own thread safety: every method takes
//! `&self` and must leave the container in a consistent state when called
//! concurrently. The applied layer adds no locking of its own.

use crate::errors::AppliedResult;

/// Thread-safe container contract shared by queues, sets and lists.
pub trait Container<T: Clone>: Send + Sync {
    /// Number of elements currently held.
    fn len(&self) -> usize;

    /// Whether the container holds no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `value` is present.
    fn contains(&self, value: &T) -> bool;

    /// Snapshot of the elements in iteration order.
    fn to_vec(&self) -> Vec<T>;

    /// Inserts `value`. Returns `false` when the container declined the element
    /// (for example a duplicate in a set).
    fn add(&self, value: T) -> AppliedResult<bool>;

    /// Removes one occurrence of `value`. Returns whether anything was removed.
    fn remove(&self, value: &T) -> AppliedResult<bool>;

    /// Removes every element.
    fn clear(&self) -> AppliedResult<()>;

    /// Removes every element and returns them in iteration order. Concurrent
    /// inserts land either in the returned batch or in the container, never
    /// in neither.
    fn take_all(&self) -> AppliedResult<Vec<T>>;

    /// Keeps only elements also present in `values` under a single
    /// acquisition of the container's lock. Returns the kept elements and the
    /// removed ones.
    ///
    /// A container that rejects mutation fails only when something would be
    /// removed.
    fn retain_split(&self, values: &[T]) -> AppliedResult<(Vec<T>, Vec<T>)>
    where
        T: PartialEq;

    /// Whether every element of `values` is present.
    fn contains_all(&self, values: &[T]) -> bool {
        values.iter().all(|value| self.contains(value))
    }

    /// Inserts every element of `values`. Returns whether the container changed.
    fn add_all<I>(&self, values: I) -> AppliedResult<bool>
    where
        I: IntoIterator<Item = T>,
        Self: Sized,
    {
        let mut changed = false;
        for value in values {
            changed |= self.add(value)?;
        }
        Ok(changed)
    }

    /// Removes every occurrence of each element of `values`. Returns whether the
    /// container changed.
    fn remove_all(&self, values: &[T]) -> AppliedResult<bool> {
        let mut changed = false;
        for value in values {
            while self.remove(value)? {
                changed = true;
            }
        }
        Ok(changed)
    }

    /// Keeps only elements also present in `values`. Returns whether the
    /// container changed.
    fn retain_all(&self, values: &[T]) -> AppliedResult<bool>
    where
        T: PartialEq,
    {
        self.retain_split(values).map(|(_, removed)| !removed.is_empty())
    }
}
