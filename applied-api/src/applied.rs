//! # Applied Capability
//!
//! Higher-order mutation primitives layered over a [`Container`] and a
//! [`TaskRunner`]. The mutation and its result happen synchronously on the
//! calling thread; the per-element callbacks of the `*_and_apply` family are
//! handed to the runner and run on a worker.
//!
//! ## Ordering
//!
//! - Per-element callbacks are fire-and-forget. They are not guaranteed to have
//!   run when the primitive returns, nor when its `on_end` hook runs.
//! - `on_end` always runs synchronously, on the calling thread, before the
//!   primitive returns, including when the backing container reports an error.
//! - Callbacks may observe container state that has already moved on.
//!   [`Applied::wait_for_consumers`] is the only barrier.
//!
//! ## Composition
//!
//! A decorator owns a backing container and a runner and exposes them through
//! [`Applied::backing`] and [`Applied::runner`]; every primitive below is then
//! provided. The decorator separately implements [`Container`] by delegation,
//! so callers get both capabilities without a shared base type.

use std::sync::Arc;

use tracing::trace;

use crate::container::Container;
use crate::errors::AppliedResult;
use crate::runner::TaskRunner;

/// The and-apply capability of a container decorator.
pub trait Applied<T>: Send + Sync
where
    T: Clone + PartialEq + Send + 'static,
{
    /// The container the primitives mutate.
    type Backing: Container<T>;

    /// Backing container owned by this decorator.
    fn backing(&self) -> &Self::Backing;

    /// Runner that executes this decorator's callbacks.
    fn runner(&self) -> &dyn TaskRunner;

    /// Inserts `value` only if `filter` holds for it.
    ///
    /// Returns `true` when the filter rejected the value (nothing attempted) or
    /// when the insertion succeeded, and `false` only when the backing container
    /// declined the insertion.
    fn add_if<P>(&self, value: T, filter: P) -> AppliedResult<bool>
    where
        P: FnOnce(&T) -> bool,
    {
        if filter(&value) {
            self.backing().add(value)
        } else {
            Ok(true)
        }
    }

    /// Like [`add_if`](Applied::add_if), but inserts `mapper(value)` when the
    /// filter holds. The filter sees the unmapped value.
    fn apply_and_add_if<M, P>(&self, value: T, mapper: M, filter: P) -> AppliedResult<bool>
    where
        M: FnOnce(T) -> T,
        P: FnOnce(&T) -> bool,
    {
        if filter(&value) {
            self.backing().add(mapper(value))
        } else {
            Ok(true)
        }
    }

    /// Inserts `mapper(value)` unconditionally.
    fn apply_and_add<M>(&self, value: T, mapper: M) -> AppliedResult<bool>
    where
        M: FnOnce(T) -> T,
    {
        self.backing().add(mapper(value))
    }

    /// Inserts `mapper(e)` for every `e` in `source`.
    ///
    /// Returns `false` without touching the container when `source` is empty,
    /// otherwise the result of the last insertion. Callers needing per-element
    /// results should loop over [`apply_and_add`](Applied::apply_and_add).
    fn apply_and_add_all<I, M>(&self, source: I, mut mapper: M) -> AppliedResult<bool>
    where
        I: IntoIterator<Item = T>,
        M: FnMut(T) -> T,
    {
        let mut result = false;
        for element in source {
            result = self.backing().add(mapper(element))?;
        }
        Ok(result)
    }

    /// Empties the container, schedules `on_element` for every element it
    /// held, then runs `on_end`. Nothing is scheduled if the container
    /// rejects the removal.
    ///
    /// Elements are taken in one step, so a concurrent insert is either
    /// applied here or left in the container.
    fn clear_and_apply<C, E>(&self, on_element: C, on_end: E) -> AppliedResult<()>
    where
        C: Fn(T) + Send + Sync + 'static,
        E: FnOnce(),
    {
        let result = self.backing().take_all().and_then(|elements| {
            trace!(count = elements.len(), "clear_and_apply");
            self.apply_each(elements, Arc::new(on_element))
        });
        on_end();
        result
    }

    /// Schedules `on_element` for every element currently held without
    /// removing anything, then runs `on_end`.
    fn consume<C, E>(&self, on_element: C, on_end: E) -> AppliedResult<()>
    where
        C: Fn(T) + Send + Sync + 'static,
        E: FnOnce(),
    {
        let elements = self.backing().to_vec();
        trace!(count = elements.len(), "consume");

        let result = self.apply_each(elements, Arc::new(on_element));
        on_end();
        result
    }

    /// Removes each element of `source` that is present and schedules
    /// `on_element` for it, then runs `on_end`.
    ///
    /// Returns `true` if at least one removal occurred.
    fn remove_all_and_apply<C, E>(&self, source: &[T], on_element: C, on_end: E) -> AppliedResult<bool>
    where
        C: Fn(T) + Send + Sync + 'static,
        E: FnOnce(),
    {
        trace!(count = source.len(), "remove_all_and_apply");
        let on_element = Arc::new(on_element);

        let result: AppliedResult<bool> = (|| {
            let mut removed = false;
            for element in source {
                if self.backing().contains(element) && self.backing().remove(element)? {
                    let callback = Arc::clone(&on_element);
                    let element = element.clone();
                    self.run_task(move || callback(element))?;
                    removed = true;
                }
            }
            Ok(removed)
        })();

        on_end();
        result
    }

    /// Removes `value` only if `filter` holds for it. Returns whether a removal
    /// occurred.
    fn remove_if<P>(&self, value: &T, filter: P) -> AppliedResult<bool>
    where
        P: FnOnce(&T) -> bool,
    {
        if filter(value) {
            self.backing().remove(value)
        } else {
            Ok(false)
        }
    }

    /// Removes every element not present in `source` and schedules
    /// `on_element` for each element that is kept, then runs `on_end`.
    ///
    /// Removed elements never reach `on_element`. Returns `true` if at least one
    /// element was removed.
    fn retain_all_and_apply<C, E>(&self, source: &[T], on_element: C, on_end: E) -> AppliedResult<bool>
    where
        C: Fn(T) + Send + Sync + 'static,
        E: FnOnce(),
    {
        trace!(count = source.len(), "retain_all_and_apply");
        let result = self.backing().retain_split(source).and_then(|(kept, removed)| {
            self.apply_each(kept, Arc::new(on_element))
                .map(|()| !removed.is_empty())
        });

        on_end();
        result
    }

    /// Submits `task` to this decorator's worker pool.
    fn run_task<F>(&self, task: F) -> AppliedResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.runner().run_task(Box::new(task))
    }

    /// Blocks until every callback scheduled so far has finished.
    fn wait_for_consumers(&self) {
        self.runner().wait_for_consumers();
    }

    /// Waits for outstanding callbacks and shuts down the worker pool.
    fn close(&self) {
        self.runner().close();
    }

    #[doc(hidden)]
    fn apply_each<C>(&self, elements: Vec<T>, on_element: Arc<C>) -> AppliedResult<()>
    where
        C: Fn(T) + Send + Sync + 'static,
    {
        for element in elements {
            let callback = Arc::clone(&on_element);
            self.run_task(move || callback(element))?;
        }
        Ok(())
    }
}
