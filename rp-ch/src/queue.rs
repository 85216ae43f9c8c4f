//! Priority queues shared by the witness search and the path combiner.
use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::{
    BinaryHeap,
    HashMap,
};
use std::hash::Hash;

/// A heap entry. Ordering only looks at `priority` and is reversed, so a [`BinaryHeap`] of items
/// pops the smallest priority first; wrap the priority in [`std::cmp::Reverse`] for max-first.
#[derive(Clone, Copy, Debug)]
pub struct PriorityQueueItem<P, T> {
    /// Sort key.
    pub priority: P,
    /// Data carried along.
    pub payload: T,
}

impl<P, T> PriorityQueueItem<P, T> {
    /// Creates an item.
    pub const fn new(priority: P, payload: T) -> Self {
        Self { priority, payload }
    }
}

impl<P: Ord, T> Ord for PriorityQueueItem<P, T> {
    fn cmp(&self, other: &Self) -> Ordering {
        other.priority.cmp(&self.priority)
    }
}

impl<P: Ord, T> PartialOrd for PriorityQueueItem<P, T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<P: Ord, T> PartialEq for PriorityQueueItem<P, T> {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority
    }
}

impl<P: Ord, T> Eq for PriorityQueueItem<P, T> {}

/// Min-priority queue over keys with decrease-key.
///
/// Decreasing a key pushes a fresh entry; the stale one is dropped when it surfaces. A popped key
/// leaves the queue and may be pushed again.
#[derive(Debug)]
pub struct KeyedPriorityQueue<K, P> {
    /// Entries, possibly stale.
    heap: BinaryHeap<PriorityQueueItem<P, K>>,
    /// Current priority of every queued key.
    queued: HashMap<K, P>,
}

impl<K, P> Default for KeyedPriorityQueue<K, P> {
    fn default() -> Self {
        Self { heap: BinaryHeap::new(), queued: HashMap::new() }
    }
}

impl<K: Copy + Eq + Hash, P: Copy + Ord> KeyedPriorityQueue<K, P> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `key`, or lowers its priority if it is queued with a higher one.
    ///
    /// Returns whether the queue changed.
    pub fn push_or_decrease(&mut self, key: K, priority: P) -> bool {
        match self.queued.entry(key) {
            Entry::Occupied(mut entry) if priority < *entry.get() => {
                entry.insert(priority);
            },
            Entry::Occupied(_) => return false,
            Entry::Vacant(entry) => {
                entry.insert(priority);
            },
        }
        self.heap.push(PriorityQueueItem::new(priority, key));
        true
    }

    /// Removes and returns the key with the lowest priority.
    pub fn pop(&mut self) -> Option<(K, P)> {
        while let Some(PriorityQueueItem { priority, payload: key }) = self.heap.pop() {
            if self.queued.get(&key) == Some(&priority) {
                self.queued.remove(&key);
                return Some((key, priority));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use std::cmp::Reverse;

    use super::*;

    #[test]
    fn test_items_pop_smallest_first() {
        let mut heap = BinaryHeap::new();
        for (priority, payload) in [(3, 'c'), (1, 'a'), (2, 'b')] {
            heap.push(PriorityQueueItem::new(priority, payload));
        }
        let order: Vec<_> = std::iter::from_fn(|| heap.pop().map(|i| i.payload)).collect();
        assert_eq!(order, vec!['a', 'b', 'c']);
    }

    #[test]
    fn test_reverse_priority_pops_largest_first() {
        let mut heap = BinaryHeap::new();
        for n in [4, 9, 1] {
            heap.push(PriorityQueueItem::new(Reverse(n), n));
        }
        assert_eq!(heap.pop().map(|i| i.payload), Some(9));
    }

    #[test]
    fn test_decrease_key() {
        let mut queue = KeyedPriorityQueue::new();
        assert!(queue.push_or_decrease(7usize, 10u64));
        assert!(queue.push_or_decrease(8, 5));
        assert!(!queue.push_or_decrease(7, 12));
        assert!(queue.push_or_decrease(7, 2));

        assert_eq!(queue.pop(), Some((7, 2)));
        assert_eq!(queue.pop(), Some((8, 5)));
        // the stale (7, 10) entry is skipped
        assert_eq!(queue.pop(), None);
    }
}
