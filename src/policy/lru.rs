//! # Least Recently Used (LRU) Cache Implementation
//!
//! Bounded cache that evicts the entry untouched for the longest time.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────────┐
//!   │                            LruCache<K, V>                                │
//!   │                                                                          │
//!   │   ┌──────────────────────────────────────────────────────────────────┐   │
//!   │   │  MemoryStore<K, SlotId> (index into the recency list)            │   │
//!   │   │                                                                  │   │
//!   │   │  ┌─────────┬───────────────────────────────────────────────┐     │   │
//!   │   │  │   Key   │  SlotId                                       │     │   │
//!   │   │  ├─────────┼───────────────────────────────────────────────┤     │   │
//!   │   │  │  page_1 │  ───────────────────────────────────────────┐ │     │   │
//!   │   │  │  page_2 │  ─────────────────────────────────────┐     │ │     │   │
//!   │   │  │  page_3 │  ───────────────────────────────┐     │     │ │     │   │
//!   │   │  └─────────┴─────────────────────────────────┼─────┼─────┼─┘     │   │
//!   │   └────────────────────────────────────────────────┼─────┼─────┼─────┘   │
//!   │                                                    │     │     │         │
//!   │   ┌────────────────────────────────────────────────┼─────┼─────┼─────┐   │
//!   │   │  IntrusiveList<(K, Arc<V>)> (recency order)    ▼     ▼     ▼     │   │
//!   │   │                                                                  │   │
//!   │   │  head ──► ┌──────┐ ◄──► ┌──────┐ ◄──► ┌──────┐ ◄── tail          │   │
//!   │   │    (MRU)  │ id_3 │      │ id_2 │      │ id_1 │   (LRU)           │   │
//!   │   │           └──────┘      └──────┘      └──────┘                   │   │
//!   │   └──────────────────────────────────────────────────────────────────┘   │
//!   └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## LRU Operations Flow
//!
//! ```text
//!   SET new item (cache full)
//!   ═══════════════════════════════════════════════════════════════════════════
//!
//!   Before:
//!     head ──► [A] ◄──► [B] ◄──► [C] ◄── tail    (capacity = 3)
//!
//!   set(D):
//!     1. Push [D] at head (4 tracked)
//!     2. Over capacity: evict [C] from tail
//!
//!   After:
//!     head ──► [D] ◄──► [A] ◄──► [B] ◄── tail
//!
//!   ═══════════════════════════════════════════════════════════════════════════
//!
//!   GET existing item
//!   ═══════════════════════════════════════════════════════════════════════════
//!
//!   get(B):   head ──► [B] ◄──► [A] ◄──► [C] ◄── tail
//!
//!   PEEK (no reordering)
//!   ═══════════════════════════════════════════════════════════════════════════
//!
//!   peek(C):  order unchanged
//! ```
//!
//! ## Methods
//!
//! | Method           | Complexity | Description                               |
//! |------------------|------------|-------------------------------------------|
//! | `new(capacity)`  | O(1)       | Create cache, `ConfigError` if capacity 0 |
//! | `set(k, v)`      | O(1)       | Insert or update, may evict LRU           |
//! | `get(&k)`        | O(1)       | Get value, moves to MRU position          |
//! | `peek(&k)`       | O(1)       | Get value without affecting LRU order     |
//! | `delete(&k)`     | O(1)       | Remove entry by key                       |
//! | `pop_lru()`      | O(1)       | Remove and return least recently used     |
//! | `peek_lru()`     | O(1)       | Peek at LRU item without removing         |
//! | `touch(&k)`      | O(1)       | Move to MRU without returning value       |
//! | `iter()`         | O(n)       | Entries from MRU to LRU                   |
//! | `clear()`        | O(n)       | Remove all entries                        |
//!
//! ## Example Usage
//!
//! ```
//! use evictkit::policy::lru::LruCache;
//! use evictkit::traits::Cache;
//!
//! let mut cache = LruCache::new(2).unwrap();
//! cache.set("a", 1).unwrap();
//! cache.set("b", 2).unwrap();
//!
//! // "a" becomes most recent, so "b" is the one to go.
//! cache.get(&"a").unwrap();
//! cache.set("c", 3).unwrap();
//!
//! assert!(cache.contains(&"a"));
//! assert!(!cache.contains(&"b"));
//! assert_eq!(cache.peek_lru().map(|(k, _)| *k), Some("a"));
//! ```
//!
//! ## Thread Safety
//!
//! - `LruCache`: single-threaded only.
//! - Wrap in [`Synchronized`](crate::policy::synchronized::Synchronized) to
//!   share across threads; values are `Arc<V>` so readers can keep them after
//!   eviction.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use tracing::trace;

use crate::ds::intrusive_list::{self, IntrusiveList};
use crate::ds::slot_arena::SlotId;
use crate::error::{CacheError, ConfigError};
use crate::store::memory::MemoryStore;
use crate::store::metrics::StoreMetrics;
use crate::traits::Cache;

/// Bounded LRU cache over an arena-backed recency list.
pub struct LruCache<K, V> {
    list: IntrusiveList<(K, Arc<V>)>,
    index: MemoryStore<K, SlotId>,
    capacity: usize,
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates a cache holding at most `capacity` entries.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `capacity` is zero.
    ///
    /// # Example
    /// ```
    /// use evictkit::policy::lru::LruCache;
    ///
    /// let cache: LruCache<u32, String> = LruCache::new(100).unwrap();
    /// assert_eq!(cache.capacity(), 100);
    /// assert!(LruCache::<u32, String>::new(0).is_err());
    /// ```
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        let capacity = ConfigError::check_capacity(capacity)?;
        Ok(Self {
            list: IntrusiveList::with_capacity(capacity),
            index: MemoryStore::with_capacity(capacity),
            capacity,
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the value without moving it to the MRU position.
    ///
    /// # Example
    ///
    /// ```
    /// use evictkit::policy::lru::LruCache;
    /// use evictkit::traits::Cache;
    ///
    /// let mut cache = LruCache::new(2).unwrap();
    /// cache.set(1, "first").unwrap();
    /// cache.set(2, "second").unwrap();
    ///
    /// assert_eq!(*cache.peek(&1).unwrap(), "first");
    ///
    /// // Key 1 is still LRU, so it goes first.
    /// cache.set(3, "third").unwrap();
    /// assert!(!cache.contains(&1));
    /// ```
    pub fn peek(&self, key: &K) -> Option<Arc<V>> {
        let id = *self.index.peek(key)?;
        self.list.get(id).map(|(_, value)| Arc::clone(value))
    }

    /// The next eviction candidate.
    pub fn peek_lru(&self) -> Option<(&K, &Arc<V>)> {
        self.list.back().map(|(key, value)| (key, value))
    }

    /// Removes and returns the least recently used entry.
    pub fn pop_lru(&mut self) -> Option<(K, Arc<V>)> {
        let (key, value) = self.list.pop_back()?;
        self.index.remove(&key);
        Some((key, value))
    }

    /// Marks `key` as most recently used. Returns `false` if absent.
    pub fn touch(&mut self, key: &K) -> bool {
        match self.index.peek(key) {
            Some(&id) => self.list.move_to_front(id),
            None => false,
        }
    }

    /// Position in recency order, `0` being most recent. O(n).
    pub fn recency_rank(&self, key: &K) -> Option<usize> {
        self.index.peek(key)?;
        self.list.iter().position(|(k, _)| k == key)
    }

    /// Entries from most to least recently used.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.list.iter(),
        }
    }

    pub fn clear(&mut self) {
        self.list.clear();
        self.index.clear();
    }

    /// Store-level counters: hits and misses count `get` calls.
    pub fn metrics(&self) -> StoreMetrics {
        self.index.metrics()
    }

    fn evict_lru(&mut self) {
        if let Some((key, _)) = self.list.pop_back() {
            self.index.remove(&key);
            self.index.record_eviction();
            trace!(capacity = self.capacity, "lru evicted tail entry");
        }
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        self.list.debug_validate_invariants();
        assert_eq!(self.list.len(), self.index.len());
        assert!(self.list.len() <= self.capacity);
        for (key, &id) in self.index.iter() {
            let (node_key, _) = self.list.get(id).expect("indexed node missing");
            assert!(node_key == key, "index points at another key's node");
        }
    }
}

impl<K, V> Cache<K, V> for LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn get(&mut self, key: &K) -> Result<Arc<V>, CacheError> {
        let id = *self.index.lookup(key).ok_or(CacheError::NotFound)?;
        self.list.move_to_front(id);
        self.list
            .get(id)
            .map(|(_, value)| Arc::clone(value))
            .ok_or(CacheError::NotFound)
    }

    fn set(&mut self, key: K, value: V) -> Result<(), CacheError> {
        if let Some(&id) = self.index.peek(&key) {
            if let Some(entry) = self.list.get_mut(id) {
                entry.1 = Arc::new(value);
            }
            self.list.move_to_front(id);
            self.index.insert(key, id);
            return Ok(());
        }

        let id = self.list.push_front((key.clone(), Arc::new(value)));
        self.index.insert(key, id);
        if self.list.len() > self.capacity {
            self.evict_lru();
        }
        Ok(())
    }

    fn delete(&mut self, key: &K) -> Result<(), CacheError> {
        if let Some(id) = self.index.remove(key) {
            self.list.remove(id);
        }
        Ok(())
    }

    fn contains(&self, key: &K) -> bool {
        self.index.contains(key)
    }

    fn len(&self) -> usize {
        self.list.len()
    }
}

impl<K, V> Extend<(K, V)> for LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            let _ = Cache::set(self, key, value);
        }
    }
}

impl<K, V> fmt::Debug for LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("len", &self.list.len())
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

/// Iterator over `(key, value)` from MRU to LRU.
pub struct Iter<'a, K, V> {
    inner: intrusive_list::Iter<'a, (K, Arc<V>)>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a Arc<V>);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, value)| (key, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys<K: Eq + Hash + Clone, V>(cache: &LruCache<K, V>) -> Vec<K> {
        cache.iter().map(|(k, _)| k.clone()).collect()
    }

    // ==============================================
    // CORRECTNESS TESTS MODULE
    // ==============================================
    mod correctness {
        use super::*;

        mod basic_behavior {
            use super::*;

            #[test]
            fn test_new_cache_creation() {
                let cache: LruCache<i32, i32> = LruCache::new(10).unwrap();
                assert_eq!(cache.capacity(), 10);
                assert_eq!(cache.len(), 0);
                assert!(cache.is_empty());
            }

            #[test]
            fn test_zero_capacity_rejected() {
                let err = LruCache::<i32, i32>::new(0).unwrap_err();
                assert!(err.message().contains("capacity"));
            }

            #[test]
            fn test_set_and_get() {
                let mut cache = LruCache::new(5).unwrap();
                cache.set(1, 100).unwrap();
                assert_eq!(*cache.get(&1).unwrap(), 100);
                assert!(cache.get(&2).unwrap_err().is_not_found());
            }

            #[test]
            fn test_set_existing_overwrites() {
                let mut cache = LruCache::new(5).unwrap();
                cache.set("k", 1).unwrap();
                cache.set("k", 2).unwrap();
                assert_eq!(cache.len(), 1);
                assert_eq!(*cache.get(&"k").unwrap(), 2);
                assert_eq!(cache.metrics().updates, 1);
            }

            #[test]
            fn test_delete_is_idempotent() {
                let mut cache = LruCache::new(5).unwrap();
                cache.set(1, 1).unwrap();
                cache.delete(&1).unwrap();
                cache.delete(&1).unwrap();
                cache.delete(&42).unwrap();
                assert!(cache.is_empty());
                cache.debug_validate_invariants();
            }

            #[test]
            fn test_null_value_is_not_a_miss() {
                let mut cache: LruCache<&str, Option<u32>> = LruCache::new(2).unwrap();
                cache.set("nothing", None).unwrap();
                assert_eq!(*cache.get(&"nothing").unwrap(), None);
                assert!(cache.get(&"absent").unwrap_err().is_not_found());
            }
        }

        mod lru_operations {
            use super::*;

            #[test]
            fn test_eviction_removes_least_recent() {
                // capacity 2: set a, set b, set c → a evicted
                let mut cache = LruCache::new(2).unwrap();
                cache.set("a", 1).unwrap();
                cache.set("b", 2).unwrap();
                cache.set("c", 3).unwrap();

                assert!(cache.get(&"a").unwrap_err().is_not_found());
                assert_eq!(*cache.get(&"b").unwrap(), 2);
                assert_eq!(*cache.get(&"c").unwrap(), 3);
                assert_eq!(cache.metrics().evictions, 1);
            }

            #[test]
            fn test_get_refreshes_recency() {
                // capacity 2: set a, set b, get a, set c → b evicted
                let mut cache = LruCache::new(2).unwrap();
                cache.set("a", 1).unwrap();
                cache.set("b", 2).unwrap();
                cache.get(&"a").unwrap();
                cache.set("c", 3).unwrap();

                assert!(cache.contains(&"a"));
                assert!(!cache.contains(&"b"));
                assert!(cache.contains(&"c"));
            }

            #[test]
            fn test_set_existing_refreshes_recency() {
                let mut cache = LruCache::new(2).unwrap();
                cache.set(1, "a").unwrap();
                cache.set(2, "b").unwrap();
                cache.set(1, "a2").unwrap();
                cache.set(3, "c").unwrap();
                assert_eq!(keys(&cache), vec![3, 1]);
            }

            #[test]
            fn test_peek_does_not_reorder() {
                let mut cache = LruCache::new(3).unwrap();
                cache.set(1, 1).unwrap();
                cache.set(2, 2).unwrap();
                assert_eq!(cache.peek(&1).as_deref(), Some(&1));
                assert_eq!(keys(&cache), vec![2, 1]);
                assert_eq!(cache.peek(&9), None);
            }

            #[test]
            fn test_pop_and_peek_lru() {
                let mut cache = LruCache::new(3).unwrap();
                for i in 1..=3 {
                    cache.set(i, i * 10).unwrap();
                }
                assert_eq!(cache.peek_lru().map(|(k, v)| (*k, **v)), Some((1, 10)));
                let (key, value) = cache.pop_lru().unwrap();
                assert_eq!((key, *value), (1, 10));
                assert_eq!(cache.len(), 2);
                cache.debug_validate_invariants();
            }

            #[test]
            fn test_touch_and_recency_rank() {
                let mut cache = LruCache::new(3).unwrap();
                for i in 1..=3 {
                    cache.set(i, ()).unwrap();
                }
                assert_eq!(cache.recency_rank(&1), Some(2));
                assert!(cache.touch(&1));
                assert!(!cache.touch(&99));
                assert_eq!(cache.recency_rank(&1), Some(0));
                assert_eq!(cache.recency_rank(&99), None);
            }

            #[test]
            fn test_set_nx_leaves_existing_untouched() {
                let mut cache = LruCache::new(2).unwrap();
                cache.set("a", 1).unwrap();
                cache.set("b", 2).unwrap();

                assert!(!cache.set_nx("a", 99).unwrap());
                assert_eq!(*cache.peek(&"a").unwrap(), 1);
                // "a" was not refreshed, so it is still the one evicted.
                cache.set("c", 3).unwrap();
                assert!(!cache.contains(&"a"));

                assert!(cache.set_nx("d", 4).unwrap());
                assert!(!cache.set_nx("d", 5).unwrap());
                assert_eq!(*cache.get(&"d").unwrap(), 4);
            }
        }

        mod edge_cases {
            use super::*;

            #[test]
            fn test_capacity_one() {
                let mut cache = LruCache::new(1).unwrap();
                cache.set(1, 1).unwrap();
                cache.set(2, 2).unwrap();
                assert_eq!(cache.len(), 1);
                assert!(!cache.contains(&1));
                assert_eq!(*cache.get(&2).unwrap(), 2);
                cache.debug_validate_invariants();
            }

            #[test]
            fn test_clear_then_reuse() {
                let mut cache = LruCache::new(4).unwrap();
                cache.extend((0..4).map(|i| (i, i)));
                cache.clear();
                assert!(cache.is_empty());
                assert_eq!(cache.pop_lru().map(|(k, _)| k), None);
                cache.set(7, 7).unwrap();
                assert_eq!(keys(&cache), vec![7]);
                cache.debug_validate_invariants();
            }

            #[test]
            fn test_values_outlive_eviction() {
                let mut cache = LruCache::new(1).unwrap();
                cache.set(1, String::from("kept")).unwrap();
                let held = cache.get(&1).unwrap();
                cache.set(2, String::from("other")).unwrap();
                assert_eq!(held.as_str(), "kept");
            }
        }
    }

    // ==============================================
    // STATE CONSISTENCY
    // ==============================================
    mod state_consistency {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[cfg_attr(miri, ignore)]
            #[test]
            fn prop_len_never_exceeds_capacity(
                capacity in 1usize..16,
                ops in prop::collection::vec((0u8..4, 0u16..32), 0..300)
            ) {
                let mut cache = LruCache::new(capacity).unwrap();
                for (op, key) in ops {
                    match op {
                        0 | 1 => { cache.set(key, key).unwrap(); }
                        2 => { let _ = cache.get(&key); }
                        _ => { cache.delete(&key).unwrap(); }
                    }
                    prop_assert!(cache.len() <= capacity);
                    cache.debug_validate_invariants();
                }
            }
        }
    }
}
