use std::fmt;

use tracing::trace;

use applied_api::applied::Applied;
use applied_api::container::Container;
use applied_api::errors::{AppliedError, AppliedResult};
use applied_api::runner::TaskRunner;

use super::backing::ConcurrentQueue;
use crate::config::ExecutorConfig;
use crate::scheduler::{Dispatcher, PoolMetrics};

/// A FIFO queue whose removals can hand the removed elements to a callback
/// running on the queue's own worker pool.
///
/// Head retrieval comes in two flavours: [`element`](Self::element) and
/// [`remove_head`](Self::remove_head) fail with [`AppliedError::NotFound`] on
/// an empty queue, while [`peek`](Self::peek) and [`poll`](Self::poll)
/// return `None`. Each has an `_and_apply` variant that schedules the
/// callback for the retrieved element.
///
/// # Examples
///
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use applied::prelude::*;
///
/// let queue = AppliedQueue::with_workers(2).unwrap();
/// queue.offer("value 1".to_string());
/// queue.offer("value 2".to_string());
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = seen.clone();
/// let head = queue.poll_and_apply(move |v| sink.lock().unwrap().push(v)).unwrap();
/// assert_eq!(head.as_deref(), Some("value 1"));
///
/// queue.close();
/// assert_eq!(*seen.lock().unwrap(), vec!["value 1".to_string()]);
/// ```
pub struct AppliedQueue<T> {
    queue: ConcurrentQueue<T>,
    dispatcher: Dispatcher,
}

impl<T: fmt::Debug> fmt::Debug for AppliedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppliedQueue")
            .field("queue", &self.queue)
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

impl<T> AppliedQueue<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    /// Empty queue with one worker per available CPU.
    pub fn new() -> AppliedResult<Self> {
        Self::with_config(ExecutorConfig::default())
    }

    /// Empty queue with `worker_count` workers.
    ///
    /// # Errors
    /// [`AppliedError::InvalidArgument`] if `worker_count` is zero.
    pub fn with_workers(worker_count: usize) -> AppliedResult<Self> {
        Self::with_config(ExecutorConfig::with_workers(worker_count))
    }

    pub fn with_config(config: ExecutorConfig) -> AppliedResult<Self> {
        Ok(Self {
            queue: ConcurrentQueue::new(),
            dispatcher: Dispatcher::new(config)?,
        })
    }

    /// Appends `value` at the tail. An unbounded queue always accepts.
    pub fn offer(&self, value: T) -> bool {
        self.queue.push_back(value);
        true
    }

    /// Appends `value` only if `filter` holds for it. Returns `true` when the
    /// filter rejected, as nothing was attempted.
    pub fn offer_if<P>(&self, value: T, filter: P) -> bool
    where
        P: FnOnce(&T) -> bool,
    {
        !filter(&value) || self.offer(value)
    }

    /// Appends `mapper(value)`.
    pub fn apply_and_offer<M>(&self, value: T, mapper: M) -> bool
    where
        M: FnOnce(T) -> T,
    {
        self.offer(mapper(value))
    }

    /// Appends `mapper(value)` only if `filter` holds for the unmapped value.
    pub fn apply_and_offer_if<M, P>(&self, value: T, mapper: M, filter: P) -> bool
    where
        M: FnOnce(T) -> T,
        P: FnOnce(&T) -> bool,
    {
        !filter(&value) || self.offer(mapper(value))
    }

    /// Removes and returns the head, or `None` if the queue is empty.
    pub fn poll(&self) -> Option<T> {
        self.queue.pop_front()
    }

    /// Returns the head without removing it, or `None` if the queue is empty.
    pub fn peek(&self) -> Option<T> {
        self.queue.front()
    }

    /// Returns the head without removing it.
    ///
    /// # Errors
    /// [`AppliedError::NotFound`] if the queue is empty.
    pub fn element(&self) -> AppliedResult<T> {
        self.peek().ok_or(AppliedError::NotFound)
    }

    /// Removes and returns the head.
    ///
    /// # Errors
    /// [`AppliedError::NotFound`] if the queue is empty.
    pub fn remove_head(&self) -> AppliedResult<T> {
        self.poll().ok_or(AppliedError::NotFound)
    }

    /// [`element`](Self::element), then schedules `consumer` for the head.
    pub fn element_and_apply<C>(&self, consumer: C) -> AppliedResult<T>
    where
        C: FnOnce(T) + Send + 'static,
    {
        trace!("element_and_apply");
        let head = self.element()?;
        self.apply_one(head.clone(), consumer)?;
        Ok(head)
    }

    /// [`peek`](Self::peek), then schedules `consumer` for the head if there is one.
    pub fn peek_and_apply<C>(&self, consumer: C) -> AppliedResult<Option<T>>
    where
        C: FnOnce(T) + Send + 'static,
    {
        trace!("peek_and_apply");
        let head = self.peek();
        if let Some(element) = &head {
            self.apply_one(element.clone(), consumer)?;
        }
        Ok(head)
    }

    /// [`poll`](Self::poll), then schedules `consumer` for the removed head if
    /// there was one.
    pub fn poll_and_apply<C>(&self, consumer: C) -> AppliedResult<Option<T>>
    where
        C: FnOnce(T) + Send + 'static,
    {
        trace!("poll_and_apply");
        let head = self.poll();
        if let Some(element) = &head {
            self.apply_one(element.clone(), consumer)?;
        }
        Ok(head)
    }

    /// [`remove_head`](Self::remove_head), then schedules `consumer` for the
    /// removed head.
    pub fn remove_and_apply<C>(&self, consumer: C) -> AppliedResult<T>
    where
        C: FnOnce(T) + Send + 'static,
    {
        trace!("remove_and_apply");
        let head = self.remove_head()?;
        self.apply_one(head.clone(), consumer)?;
        Ok(head)
    }

    /// Removes every element matching `matcher` and schedules `consumer` for
    /// each of them. Returns whether anything was removed.
    pub fn remove_if_and_apply<P, C>(&self, matcher: P, consumer: C) -> AppliedResult<bool>
    where
        P: FnMut(&T) -> bool,
        C: Fn(T) + Send + Sync + 'static,
    {
        trace!("remove_if_and_apply");
        let removed = self.queue.remove_matching(matcher);
        let any = !removed.is_empty();
        self.apply_each(removed, std::sync::Arc::new(consumer))?;
        Ok(any)
    }

    pub fn metrics(&self) -> PoolMetrics {
        self.dispatcher.metrics()
    }

    fn apply_one<C>(&self, element: T, consumer: C) -> AppliedResult<()>
    where
        C: FnOnce(T) + Send + 'static,
    {
        self.run_task(move || consumer(element))
    }
}

impl<T> Container<T> for AppliedQueue<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    fn len(&self) -> usize {
        self.queue.len()
    }

    fn contains(&self, value: &T) -> bool {
        self.queue.contains(value)
    }

    fn to_vec(&self) -> Vec<T> {
        self.queue.to_vec()
    }

    fn add(&self, value: T) -> AppliedResult<bool> {
        self.queue.add(value)
    }

    fn remove(&self, value: &T) -> AppliedResult<bool> {
        self.queue.remove(value)
    }

    fn clear(&self) -> AppliedResult<()> {
        self.queue.clear()
    }

    fn take_all(&self) -> AppliedResult<Vec<T>> {
        self.queue.take_all()
    }

    fn retain_split(&self, values: &[T]) -> AppliedResult<(Vec<T>, Vec<T>)> {
        self.queue.retain_split(values)
    }
}

impl<T> Applied<T> for AppliedQueue<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    type Backing = ConcurrentQueue<T>;

    fn backing(&self) -> &Self::Backing {
        &self.queue
    }

    fn runner(&self) -> &dyn TaskRunner {
        &self.dispatcher
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn collector() -> (Arc<Mutex<Vec<String>>>, impl Fn(String) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |v: String| sink.lock().unwrap().push(v))
    }

    fn queue_of(values: &[&str]) -> AppliedQueue<String> {
        let queue = AppliedQueue::with_workers(2).unwrap();
        for value in values {
            queue.offer(value.to_string());
        }
        queue
    }

    #[test]
    fn test_empty_head_retrieval() {
        let queue: AppliedQueue<String> = AppliedQueue::with_workers(1).unwrap();

        assert_eq!(queue.peek(), None);
        assert_eq!(queue.poll(), None);
        assert_eq!(queue.element(), Err(AppliedError::NotFound));
        assert_eq!(queue.remove_head(), Err(AppliedError::NotFound));
        assert_eq!(queue.peek_and_apply(|_| {}), Ok(None));
        assert_eq!(queue.remove_and_apply(|_| {}), Err(AppliedError::NotFound));
    }

    #[test]
    fn test_element_and_apply_keeps_head() {
        let queue = queue_of(&["a", "b"]);
        let (seen, sink) = collector();

        assert_eq!(queue.element_and_apply(sink), Ok("a".to_string()));
        queue.close();

        assert_eq!(*seen.lock().unwrap(), vec!["a".to_string()]);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_remove_if_and_apply() {
        let queue = queue_of(&["keep", "drop 1", "keep", "drop 2"]);
        let (seen, sink) = collector();

        assert!(queue.remove_if_and_apply(|v| v.starts_with("drop"), sink).unwrap());
        assert!(!queue.remove_if_and_apply(|v| v.starts_with("drop"), |_| {}).unwrap());
        queue.close();

        let mut seen = seen.lock().unwrap().clone();
        seen.sort();
        assert_eq!(seen, vec!["drop 1".to_string(), "drop 2".to_string()]);
        assert_eq!(queue.to_vec(), vec!["keep".to_string(), "keep".to_string()]);
    }

    #[test]
    fn test_offer_if_and_mapped_offers() {
        let queue: AppliedQueue<i32> = AppliedQueue::with_workers(1).unwrap();

        assert!(queue.offer_if(1, |n| *n > 5));
        assert!(queue.offer_if(7, |n| *n > 5));
        assert!(queue.apply_and_offer(2, |n| n * 10));
        assert!(queue.apply_and_offer_if(9, |n| n + 1, |n| *n == 9));
        assert!(queue.apply_and_offer_if(3, |n| n + 1, |n| *n == 9));

        assert_eq!(queue.to_vec(), vec![7, 20, 10]);
    }
}
