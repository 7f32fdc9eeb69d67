//! Thread-safe backing containers owned by the applied decorators.
//!
//! Each container guards its elements with its own lock and recovers the
//! guard if a previous holder panicked.

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use applied_api::container::Container;
use applied_api::errors::{AppliedError, AppliedResult};

/// Splits `elements` into those present in `values` and the rest, keeping
/// their relative order.
fn split_retained<T, I>(elements: I, values: &[T]) -> (Vec<T>, Vec<T>)
where
    T: PartialEq,
    I: IntoIterator<Item = T>,
{
    elements.into_iter().partition(|element| values.contains(element))
}

// --- Queue ---

/// FIFO queue behind [`AppliedQueue`](super::AppliedQueue).
pub struct ConcurrentQueue<T> {
    elements: Mutex<VecDeque<T>>,
}

impl<T> Default for ConcurrentQueue<T> {
    fn default() -> Self {
        Self {
            elements: Mutex::new(VecDeque::new()),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ConcurrentQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.lock().iter()).finish()
    }
}

impl<T> ConcurrentQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.elements.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `value` at the tail.
    pub fn push_back(&self, value: T) {
        self.lock().push_back(value);
    }

    /// Removes and returns the head.
    pub fn pop_front(&self) -> Option<T> {
        self.lock().pop_front()
    }

    /// Removes every element matching `matcher`, returning them in queue order.
    pub fn remove_matching<P>(&self, mut matcher: P) -> Vec<T>
    where
        P: FnMut(&T) -> bool,
    {
        let mut elements = self.lock();
        let mut removed = Vec::new();
        let mut kept = VecDeque::with_capacity(elements.len());
        for element in elements.drain(..) {
            if matcher(&element) {
                removed.push(element);
            } else {
                kept.push_back(element);
            }
        }
        *elements = kept;
        removed
    }
}

impl<T: Clone> ConcurrentQueue<T> {
    /// Copy of the head.
    pub fn front(&self) -> Option<T> {
        self.lock().front().cloned()
    }
}

impl<T> Container<T> for ConcurrentQueue<T>
where
    T: Clone + PartialEq + Send,
{
    fn len(&self) -> usize {
        self.lock().len()
    }

    fn contains(&self, value: &T) -> bool {
        self.lock().contains(value)
    }

    fn to_vec(&self) -> Vec<T> {
        self.lock().iter().cloned().collect()
    }

    fn add(&self, value: T) -> AppliedResult<bool> {
        self.push_back(value);
        Ok(true)
    }

    fn remove(&self, value: &T) -> AppliedResult<bool> {
        let mut elements = self.lock();
        match elements.iter().position(|e| e == value) {
            Some(index) => {
                elements.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn clear(&self) -> AppliedResult<()> {
        self.lock().clear();
        Ok(())
    }

    fn take_all(&self) -> AppliedResult<Vec<T>> {
        Ok(self.lock().drain(..).collect())
    }

    fn retain_split(&self, values: &[T]) -> AppliedResult<(Vec<T>, Vec<T>)> {
        let mut elements = self.lock();
        let (kept, removed) = split_retained(elements.drain(..), values);
        elements.extend(kept.iter().cloned());
        Ok((kept, removed))
    }
}

// --- Set ---

/// Hash set behind [`AppliedSet`](super::AppliedSet). A frozen set rejects
/// every mutation with [`AppliedError::Unsupported`].
pub struct SyncSet<T> {
    elements: RwLock<HashSet<T>>,
    frozen: bool,
}

impl<T> Default for SyncSet<T> {
    fn default() -> Self {
        Self {
            elements: RwLock::new(HashSet::new()),
            frozen: false,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for SyncSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.read().iter()).finish()
    }
}

impl<T> SyncSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn immutable() -> AppliedError {
        AppliedError::Unsupported("set is immutable".to_string())
    }

    fn read(&self) -> RwLockReadGuard<'_, HashSet<T>> {
        self.elements.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> AppliedResult<RwLockWriteGuard<'_, HashSet<T>>> {
        if self.frozen {
            return Err(Self::immutable());
        }
        Ok(self.elements.write().unwrap_or_else(PoisonError::into_inner))
    }
}

impl<T: Eq + Hash> SyncSet<T> {
    /// Immutable set holding `values`.
    pub fn frozen<I>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        Self {
            elements: RwLock::new(values.into_iter().collect()),
            frozen: true,
        }
    }
}

impl<T> Container<T> for SyncSet<T>
where
    T: Clone + Eq + Hash + Send + Sync,
{
    fn len(&self) -> usize {
        self.read().len()
    }

    fn contains(&self, value: &T) -> bool {
        self.read().contains(value)
    }

    fn to_vec(&self) -> Vec<T> {
        self.read().iter().cloned().collect()
    }

    fn add(&self, value: T) -> AppliedResult<bool> {
        Ok(self.write()?.insert(value))
    }

    fn remove(&self, value: &T) -> AppliedResult<bool> {
        Ok(self.write()?.remove(value))
    }

    fn clear(&self) -> AppliedResult<()> {
        self.write()?.clear();
        Ok(())
    }

    fn take_all(&self) -> AppliedResult<Vec<T>> {
        Ok(self.write()?.drain().collect())
    }

    fn retain_split(&self, values: &[T]) -> AppliedResult<(Vec<T>, Vec<T>)> {
        if self.frozen {
            let (kept, removed) = split_retained(self.read().iter().cloned(), values);
            return if removed.is_empty() {
                Ok((kept, removed))
            } else {
                Err(Self::immutable())
            };
        }
        let mut elements = self.write()?;
        let (kept, removed) = split_retained(elements.drain(), values);
        elements.extend(kept.iter().cloned());
        Ok((kept, removed))
    }
}

// --- List ---

/// Indexed list behind [`AppliedList`](super::AppliedList). A frozen list
/// rejects every mutation with [`AppliedError::Unsupported`].
pub struct SyncList<T> {
    elements: RwLock<Vec<T>>,
    frozen: bool,
}

impl<T> Default for SyncList<T> {
    fn default() -> Self {
        Self {
            elements: RwLock::new(Vec::new()),
            frozen: false,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for SyncList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.read().iter()).finish()
    }
}

impl<T> SyncList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Immutable list holding `values` in order.
    pub fn frozen<I>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        Self {
            elements: RwLock::new(values.into_iter().collect()),
            frozen: true,
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn immutable() -> AppliedError {
        AppliedError::Unsupported("list is immutable".to_string())
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<T>> {
        self.elements.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> AppliedResult<RwLockWriteGuard<'_, Vec<T>>> {
        if self.frozen {
            return Err(Self::immutable());
        }
        Ok(self.elements.write().unwrap_or_else(PoisonError::into_inner))
    }

    /// Inserts `value` at `index`, shifting later elements right.
    pub fn insert(&self, index: usize, value: T) -> AppliedResult<()> {
        let mut elements = self.write()?;
        if index > elements.len() {
            return Err(AppliedError::IndexOutOfRange {
                index,
                len: elements.len(),
            });
        }
        elements.insert(index, value);
        Ok(())
    }

    /// Removes and returns the element at `index`.
    pub fn remove_at(&self, index: usize) -> AppliedResult<T> {
        let mut elements = self.write()?;
        if index >= elements.len() {
            return Err(AppliedError::IndexOutOfRange {
                index,
                len: elements.len(),
            });
        }
        Ok(elements.remove(index))
    }

    /// Removes and returns the element at `index` if `matcher` holds for it.
    ///
    /// The bounds check comes first, so an out-of-range index fails even when
    /// the matcher would have rejected.
    pub fn remove_at_if<P>(&self, index: usize, matcher: P) -> AppliedResult<Option<T>>
    where
        P: FnOnce(&T) -> bool,
    {
        let mut elements = self.write()?;
        let len = elements.len();
        let Some(element) = elements.get(index) else {
            return Err(AppliedError::IndexOutOfRange { index, len });
        };
        if matcher(element) {
            Ok(Some(elements.remove(index)))
        } else {
            Ok(None)
        }
    }
}

impl<T: Clone> SyncList<T> {
    /// Copy of the element at `index`.
    pub fn get(&self, index: usize) -> AppliedResult<T> {
        let elements = self.read();
        elements
            .get(index)
            .cloned()
            .ok_or(AppliedError::IndexOutOfRange {
                index,
                len: elements.len(),
            })
    }
}

impl<T: PartialEq> SyncList<T> {
    /// Position of the first occurrence of `value`.
    pub fn index_of(&self, value: &T) -> Option<usize> {
        self.read().iter().position(|e| e == value)
    }
}

impl<T> Container<T> for SyncList<T>
where
    T: Clone + PartialEq + Send + Sync,
{
    fn len(&self) -> usize {
        self.read().len()
    }

    fn contains(&self, value: &T) -> bool {
        self.read().contains(value)
    }

    fn to_vec(&self) -> Vec<T> {
        self.read().clone()
    }

    fn add(&self, value: T) -> AppliedResult<bool> {
        self.write()?.push(value);
        Ok(true)
    }

    fn remove(&self, value: &T) -> AppliedResult<bool> {
        let mut elements = self.write()?;
        match elements.iter().position(|e| e == value) {
            Some(index) => {
                elements.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn clear(&self) -> AppliedResult<()> {
        self.write()?.clear();
        Ok(())
    }

    fn take_all(&self) -> AppliedResult<Vec<T>> {
        Ok(self.write()?.drain(..).collect())
    }

    fn retain_split(&self, values: &[T]) -> AppliedResult<(Vec<T>, Vec<T>)> {
        if self.frozen {
            let (kept, removed) = split_retained(self.read().iter().cloned(), values);
            return if removed.is_empty() {
                Ok((kept, removed))
            } else {
                Err(Self::immutable())
            };
        }
        let mut elements = self.write()?;
        let (kept, removed) = split_retained(elements.drain(..), values);
        elements.extend(kept.iter().cloned());
        Ok((kept, removed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_fifo_and_remove_matching() {
        let queue = ConcurrentQueue::new();
        for n in 1..=5 {
            queue.push_back(n);
        }

        assert_eq!(queue.front(), Some(1));
        assert_eq!(queue.remove_matching(|n| n % 2 == 0), vec![2, 4]);
        assert_eq!(queue.to_vec(), vec![1, 3, 5]);
        assert_eq!(queue.pop_front(), Some(1));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_queue_retain_all() {
        let queue = ConcurrentQueue::new();
        queue.add_all(["a", "b", "c"]).unwrap();

        assert!(queue.retain_all(&["a", "c"]).unwrap());
        assert!(!queue.retain_all(&["a", "c"]).unwrap());
        assert_eq!(queue.to_vec(), vec!["a", "c"]);
    }

    #[test]
    fn test_queue_take_all_and_retain_split() {
        let queue = ConcurrentQueue::new();
        queue.add_all([1, 2, 3, 4]).unwrap();

        assert_eq!(queue.retain_split(&[4, 2]), Ok((vec![2, 4], vec![1, 3])));
        assert_eq!(queue.take_all(), Ok(vec![2, 4]));
        assert!(queue.is_empty());
        assert_eq!(queue.take_all(), Ok(Vec::new()));
    }

    #[test]
    fn test_set_rejects_duplicates() {
        let set = SyncSet::new();
        assert!(set.add(1).unwrap());
        assert!(!set.add(1).unwrap());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_frozen_set_is_immutable() {
        let set = SyncSet::frozen([1, 2]);
        assert!(set.is_frozen());
        assert!(matches!(set.add(3), Err(AppliedError::Unsupported(_))));
        assert!(matches!(set.remove(&1), Err(AppliedError::Unsupported(_))));
        assert!(matches!(set.clear(), Err(AppliedError::Unsupported(_))));
        assert!(matches!(set.take_all(), Err(AppliedError::Unsupported(_))));
        assert!(matches!(set.retain_split(&[1]), Err(AppliedError::Unsupported(_))));
        assert_eq!(set.len(), 2);

        // Retaining everything removes nothing and is allowed
        let (mut kept, removed) = set.retain_split(&[1, 2, 3]).unwrap();
        kept.sort();
        assert_eq!(kept, vec![1, 2]);
        assert!(removed.is_empty());
    }

    #[test]
    fn test_list_index_operations() {
        let list = SyncList::new();
        list.add_all(["a", "c"]).unwrap();
        list.insert(1, "b").unwrap();

        assert_eq!(list.to_vec(), vec!["a", "b", "c"]);
        assert_eq!(list.get(2), Ok("c"));
        assert_eq!(list.index_of(&"b"), Some(1));
        assert_eq!(list.get(3), Err(AppliedError::IndexOutOfRange { index: 3, len: 3 }));
        assert_eq!(list.insert(5, "z"), Err(AppliedError::IndexOutOfRange { index: 5, len: 3 }));
    }

    #[test]
    fn test_list_remove_at_if() {
        let list = SyncList::new();
        list.add_all([10, 20, 30]).unwrap();

        assert_eq!(list.remove_at_if(1, |n| *n > 100), Ok(None));
        assert_eq!(list.remove_at_if(1, |n| *n == 20), Ok(Some(20)));
        assert_eq!(
            list.remove_at_if(7, |_| true),
            Err(AppliedError::IndexOutOfRange { index: 7, len: 2 })
        );
        assert_eq!(list.to_vec(), vec![10, 30]);
    }

    #[test]
    fn test_list_take_all_and_retain_split() {
        let list = SyncList::new();
        list.add_all(["x", "y", "x", "z"]).unwrap();

        assert_eq!(list.retain_split(&["x", "z"]), Ok((vec!["x", "x", "z"], vec!["y"])));
        assert_eq!(list.take_all(), Ok(vec!["x", "x", "z"]));
        assert!(list.is_empty());

        let frozen = SyncList::frozen([1, 2]);
        assert!(matches!(frozen.take_all(), Err(AppliedError::Unsupported(_))));
        assert_eq!(frozen.retain_split(&[1, 2]), Ok((vec![1, 2], Vec::new())));
    }
}
