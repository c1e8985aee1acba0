//! # LFU (Least Frequently Used) Cache Implementation
//!
//! Bounded cache that evicts the entry with the fewest accesses, breaking ties
//! by age: among entries with the same count, the one that reached that count
//! first goes first. Every operation is O(1).
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────────┐
//!   │                          LfuCache<K, V>                                  │
//!   │                                                                          │
//!   │   ┌────────────────────────────────────────────────────────────────────┐ │
//!   │   │  FrequencyBuckets<K>                                               │ │
//!   │   │                                                                    │ │
//!   │   │  min ─► [freq 1] ◄──► [freq 3] ◄──► [freq 7]    (strictly rising)  │ │
//!   │   │          page_3        page_2        page_1                        │ │
//!   │   │          page_5                                                    │ │
//!   │   │            ▲                                                       │ │
//!   │   │            └── oldest in lowest bucket = eviction victim           │ │
//!   │   └────────────────────────────────────────────────────────────────────┘ │
//!   │                                                                          │
//!   │   ┌────────────────────────────────────────────────────────────────────┐ │
//!   │   │  MemoryStore<K, Arc<V>> (values live here)                         │ │
//!   │   └────────────────────────────────────────────────────────────────────┘ │
//!   │                                                                          │
//!   │   capacity: usize  (maximum entries)                                     │
//!   └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## LFU vs LRU Comparison
//!
//! ```text
//!   Access pattern: A, B, A, C, A, D, A, E, A, F  (A accessed 5 times, others 1 each)
//!   Cache capacity: 3
//!
//!   LRU (recency-based):
//!     Insert F:      [F, E, D]  ← A evicted (even though accessed 5 times)
//!
//!   LFU (frequency-based):
//!     Insert F:      {A:5, F:1, E:1}  ← D evicted (oldest at freq=1)
//! ```
//!
//! ## Set Flow
//!
//! ```text
//!   set(key, value)
//!        │
//!        ▼
//!   ┌────────────────────────────────────────────────────────────────────────┐
//!   │ Key already tracked?                                                   │
//!   │   YES → replace value, frequency += 1, done                            │
//!   │   NO  → continue                                                       │
//!   └────────────────────────────────────────────────────────────────────────┘
//!        │
//!        ▼
//!   ┌────────────────────────────────────────────────────────────────────────┐
//!   │ Tracked == capacity?                                                   │
//!   │   YES → evict oldest entry of the lowest bucket first                  │
//!   └────────────────────────────────────────────────────────────────────────┘
//!        │
//!        ▼
//!   insert at frequency 1 (bucket created at the head if missing)
//! ```
//!
//! Eviction happens before the insert, so the tracked count never exceeds
//! the capacity, not even in the middle of a `set`.
//!
//! ## Example Usage
//!
//! ```
//! use evictkit::policy::lfu::LfuCache;
//! use evictkit::traits::Cache;
//!
//! let mut cache = LfuCache::new(2).unwrap();
//! cache.set("a", 1).unwrap();
//! cache.set("b", 2).unwrap();
//! cache.get(&"a").unwrap();
//! cache.get(&"a").unwrap();
//!
//! cache.set("c", 3).unwrap(); // "b" has the lowest count
//! assert!(!cache.contains(&"b"));
//! assert_eq!(cache.frequency(&"a"), Some(3));
//! assert_eq!(cache.frequency(&"c"), Some(1));
//! ```
//!
//! ## Thread Safety
//!
//! Single-threaded. Use
//! [`Synchronized`](crate::policy::synchronized::Synchronized) for shared
//! access.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use tracing::trace;

use crate::ds::frequency_buckets::FrequencyBuckets;
use crate::error::{CacheError, ConfigError};
use crate::store::memory::MemoryStore;
use crate::store::metrics::StoreMetrics;
use crate::traits::Cache;

/// Bounded O(1) LFU cache.
pub struct LfuCache<K, V> {
    buckets: FrequencyBuckets<K>,
    store: MemoryStore<K, Arc<V>>,
    capacity: usize,
}

impl<K, V> LfuCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates a cache holding at most `capacity` entries.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        let capacity = ConfigError::check_capacity(capacity)?;
        Ok(Self {
            buckets: FrequencyBuckets::with_capacity(capacity),
            store: MemoryStore::with_capacity(capacity),
            capacity,
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Access count of `key`; a fresh entry starts at 1.
    pub fn frequency(&self, key: &K) -> Option<u64> {
        self.buckets.frequency(key)
    }

    /// Value for `key` without counting an access.
    pub fn peek(&self, key: &K) -> Option<Arc<V>> {
        self.store.peek(key).cloned()
    }

    /// The entry [`pop_lfu`](Self::pop_lfu) would remove next.
    pub fn peek_lfu(&self) -> Option<(&K, &Arc<V>)> {
        let (key, _) = self.buckets.peek_min()?;
        self.store.peek(key).map(|value| (key, value))
    }

    /// Removes and returns the least frequently used entry.
    pub fn pop_lfu(&mut self) -> Option<(K, Arc<V>)> {
        let (key, _) = self.buckets.pop_min()?;
        let value = self.store.remove(&key)?;
        Some((key, value))
    }

    /// Counts an access without reading the value. Returns the new count.
    pub fn increment_frequency(&mut self, key: &K) -> Option<u64> {
        self.buckets.touch(key)
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
        self.store.clear();
    }

    pub fn metrics(&self) -> StoreMetrics {
        self.store.metrics()
    }

    fn evict_lfu(&mut self) {
        if let Some((key, freq)) = self.buckets.pop_min() {
            self.store.remove(&key);
            self.store.record_eviction();
            trace!(freq, capacity = self.capacity, "lfu evicted entry");
        }
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        self.buckets.debug_validate_invariants();
        assert_eq!(self.buckets.len(), self.store.len());
        assert!(self.store.len() <= self.capacity);
        for key in self.store.keys() {
            assert!(self.buckets.contains(key), "stored key has no frequency");
        }
    }
}

impl<K, V> Cache<K, V> for LfuCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn get(&mut self, key: &K) -> Result<Arc<V>, CacheError> {
        let value = self.store.lookup(key).cloned().ok_or(CacheError::NotFound)?;
        self.buckets.touch(key);
        Ok(value)
    }

    fn set(&mut self, key: K, value: V) -> Result<(), CacheError> {
        if self.store.contains(&key) {
            self.buckets.touch(&key);
            self.store.insert(key, Arc::new(value));
            return Ok(());
        }

        if self.store.len() >= self.capacity {
            self.evict_lfu();
        }
        self.buckets.insert(key.clone());
        self.store.insert(key, Arc::new(value));
        Ok(())
    }

    fn delete(&mut self, key: &K) -> Result<(), CacheError> {
        if self.store.remove(key).is_some() {
            self.buckets.remove(key);
        }
        Ok(())
    }

    fn contains(&self, key: &K) -> bool {
        self.store.contains(key)
    }

    fn len(&self) -> usize {
        self.store.len()
    }
}

impl<K, V> Extend<(K, V)> for LfuCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            let _ = Cache::set(self, key, value);
        }
    }
}

impl<K, V> fmt::Debug for LfuCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LfuCache")
            .field("len", &self.store.len())
            .field("capacity", &self.capacity)
            .field("min_freq", &self.buckets.min_freq())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==============================================
    // CORRECTNESS TESTS MODULE
    // ==============================================
    mod correctness {
        use super::*;

        mod basic_behavior {
            use super::*;

            #[test]
            fn test_new_cache_creation() {
                let cache: LfuCache<u32, u32> = LfuCache::new(8).unwrap();
                assert_eq!(cache.capacity(), 8);
                assert!(cache.is_empty());
                assert!(LfuCache::<u32, u32>::new(0).is_err());
            }

            #[test]
            fn test_get_increments_frequency() {
                let mut cache = LfuCache::new(4).unwrap();
                cache.set(1, "one").unwrap();
                assert_eq!(cache.frequency(&1), Some(1));
                assert_eq!(*cache.get(&1).unwrap(), "one");
                assert_eq!(cache.frequency(&1), Some(2));
                assert!(cache.get(&2).unwrap_err().is_not_found());
                assert_eq!(cache.frequency(&2), None);
            }

            #[test]
            fn test_set_existing_counts_as_access() {
                let mut cache = LfuCache::new(4).unwrap();
                cache.set("k", 1).unwrap();
                cache.set("k", 2).unwrap();
                assert_eq!(cache.frequency(&"k"), Some(2));
                assert_eq!(*cache.peek(&"k").unwrap(), 2);
                assert_eq!(cache.len(), 1);
            }

            #[test]
            fn test_peek_does_not_count() {
                let mut cache = LfuCache::new(4).unwrap();
                cache.set("k", 1).unwrap();
                cache.peek(&"k");
                cache.peek(&"k");
                assert_eq!(cache.frequency(&"k"), Some(1));
            }

            #[test]
            fn test_delete_is_idempotent() {
                let mut cache = LfuCache::new(2).unwrap();
                cache.set(1, 1).unwrap();
                cache.delete(&1).unwrap();
                cache.delete(&1).unwrap();
                assert!(cache.get(&1).unwrap_err().is_not_found());
                cache.debug_validate_invariants();
            }
        }

        mod lfu_operations {
            use super::*;

            #[test]
            fn test_lowest_frequency_is_evicted() {
                // capacity 2: set a, set b, get a, get a, set c → b evicted
                let mut cache = LfuCache::new(2).unwrap();
                cache.set("a", 1).unwrap();
                cache.set("b", 2).unwrap();
                cache.get(&"a").unwrap();
                cache.get(&"a").unwrap();
                cache.set("c", 3).unwrap();

                assert!(cache.get(&"b").unwrap_err().is_not_found());
                assert_eq!(*cache.get(&"a").unwrap(), 1);
                assert_eq!(*cache.get(&"c").unwrap(), 3);
                assert_eq!(cache.metrics().evictions, 1);
            }

            #[test]
            fn test_ties_evict_oldest() {
                let mut cache = LfuCache::new(3).unwrap();
                cache.set(1, ()).unwrap();
                cache.set(2, ()).unwrap();
                cache.set(3, ()).unwrap();
                cache.set(4, ()).unwrap();
                assert!(!cache.contains(&1));

                cache.set(5, ()).unwrap();
                assert!(!cache.contains(&2));
                assert!(cache.contains(&3));
            }

            #[test]
            fn test_hot_key_survives_scan() {
                let mut cache = LfuCache::new(3).unwrap();
                cache.set('A', 0).unwrap();
                for _ in 0..4 {
                    cache.get(&'A').unwrap();
                }
                for key in ['B', 'C', 'D', 'E', 'F'] {
                    cache.set(key, 0).unwrap();
                }
                assert!(cache.contains(&'A'));
                assert_eq!(cache.frequency(&'A'), Some(5));
                cache.debug_validate_invariants();
            }

            #[test]
            fn test_peek_and_pop_lfu() {
                let mut cache = LfuCache::new(3).unwrap();
                cache.set("x", 10).unwrap();
                cache.set("y", 20).unwrap();
                cache.get(&"x").unwrap();

                assert_eq!(cache.peek_lfu().map(|(k, v)| (*k, **v)), Some(("y", 20)));
                let (key, value) = cache.pop_lfu().unwrap();
                assert_eq!((key, *value), ("y", 20));
                assert_eq!(cache.len(), 1);
                cache.debug_validate_invariants();
            }

            #[test]
            fn test_increment_frequency() {
                let mut cache = LfuCache::new(2).unwrap();
                cache.set(1, ()).unwrap();
                cache.set(2, ()).unwrap();
                assert_eq!(cache.increment_frequency(&1), Some(2));
                assert_eq!(cache.increment_frequency(&9), None);
                cache.set(3, ()).unwrap();
                assert!(cache.contains(&1));
                assert!(!cache.contains(&2));
            }

            #[test]
            fn test_set_nx_does_not_count_access() {
                let mut cache = LfuCache::new(2).unwrap();
                cache.set("a", 1).unwrap();
                assert!(!cache.set_nx("a", 2).unwrap());
                assert_eq!(cache.frequency(&"a"), Some(1));
                assert_eq!(*cache.peek(&"a").unwrap(), 1);
                assert!(cache.set_nx("b", 2).unwrap());
                assert_eq!(cache.len(), 2);
            }
        }

        mod edge_cases {
            use super::*;

            #[test]
            fn test_capacity_one_replaces() {
                let mut cache = LfuCache::new(1).unwrap();
                cache.set(1, 1).unwrap();
                cache.get(&1).unwrap();
                cache.set(2, 2).unwrap();
                assert_eq!(cache.len(), 1);
                assert!(cache.contains(&2));
                assert_eq!(cache.frequency(&2), Some(1));
            }

            #[test]
            fn test_clear_resets_everything() {
                let mut cache = LfuCache::new(3).unwrap();
                cache.extend([(1, 1), (2, 2)]);
                cache.get(&1).unwrap();
                cache.clear();
                assert!(cache.is_empty());
                assert_eq!(cache.peek_lfu(), None);
                assert_eq!(cache.pop_lfu(), None);
                cache.debug_validate_invariants();
            }

            #[test]
            fn test_null_value_is_not_a_miss() {
                let mut cache: LfuCache<u8, Option<String>> = LfuCache::new(1).unwrap();
                cache.set(0, None).unwrap();
                assert!(cache.get(&0).unwrap().is_none());
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
                let mut cache = LfuCache::new(capacity).unwrap();
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

            #[cfg_attr(miri, ignore)]
            #[test]
            fn prop_victim_has_minimum_frequency(
                gets in prop::collection::vec(0u8..8, 0..64)
            ) {
                let mut cache = LfuCache::new(8).unwrap();
                for key in 0u8..8 {
                    cache.set(key, ()).unwrap();
                }
                for key in gets {
                    cache.get(&key).unwrap();
                }
                let lowest = (0u8..8).filter_map(|k| cache.frequency(&k)).min();
                let victim = cache.peek_lfu().map(|(k, _)| *k);
                prop_assert_eq!(victim.and_then(|k| cache.frequency(&k)), lowest);
            }
        }
    }
}
