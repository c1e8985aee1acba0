//! Frequency buckets for O(1) LFU tracking.
//!
//! Keys are grouped by access count. Buckets form a doubly linked sequence in
//! strictly increasing frequency order, and each bucket is itself a FIFO list
//! of the keys currently at that count, so the eviction candidate is always
//! the oldest key in the lowest bucket.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                        FrequencyBuckets<K> Layout                           │
//! │                                                                             │
//! │   index: FxHashMap<K, SlotId>        entries: SlotArena<Entry<K>>           │
//! │   ┌───────────┬──────────┐           ┌──────┬──────────────────────┐        │
//! │   │  "page_a" │   id_0   │──────────►│ id_0 │ freq:2, prev/next    │        │
//! │   │  "page_b" │   id_1   │──────────►│ id_1 │ freq:1, prev/next    │        │
//! │   │  "page_c" │   id_2   │──────────►│ id_2 │ freq:1, prev/next    │        │
//! │   └───────────┴──────────┘           └──────┴──────────────────────┘        │
//! │                                                                             │
//! │   buckets: FxHashMap<u64, Bucket>   (frequency → bucket, linked in order)   │
//! │                                                                             │
//! │   min_freq = 1                                                              │
//! │       │                                                                     │
//! │       ▼                                                                     │
//! │   freq=1: head ──► [id_2] ◄──► [id_1] ◄── tail   (tail = oldest, evicted)   │
//! │       │                                                                     │
//! │      next                                                                   │
//! │       ▼                                                                     │
//! │   freq=2: head ──► [id_0] ◄── tail                                          │
//! └─────────────────────────────────────────────────────────────────────────────┘
//!
//! Touch (promote)
//! ───────────────
//!   1. unlink key from bucket f
//!   2. if bucket f+1 is missing → chain it in right after f
//!   3. if bucket f is now empty → drop it, min_freq follows the chain
//!   4. push key at the head of bucket f+1   (f = u64::MAX: back into f)
//!
//! Eviction (pop_min)
//! ──────────────────
//!   1. bucket = buckets[min_freq]
//!   2. pop its tail (oldest at that frequency)
//!   3. drop the bucket if empty, min_freq = bucket.next
//! ```
//!
//! ## Operations
//!
//! | Operation  | Time | Notes                                   |
//! |------------|------|-----------------------------------------|
//! | `insert`   | O(1) | New key starts at freq=1                |
//! | `touch`    | O(1) | Increment frequency, newest in bucket   |
//! | `remove`   | O(1) | Empty bucket pruned                     |
//! | `pop_min`  | O(1) | Oldest key in lowest bucket             |
//!
//! ## Example Usage
//!
//! ```
//! use evictkit::ds::FrequencyBuckets;
//!
//! let mut freq = FrequencyBuckets::new();
//! freq.insert("page_a");
//! freq.insert("page_b");
//! freq.insert("page_c");
//!
//! freq.touch(&"page_a"); // freq=2
//! freq.touch(&"page_a"); // freq=3
//!
//! assert_eq!(freq.frequencies(), vec![1, 3]);
//! assert_eq!(freq.pop_min(), Some(("page_b", 1))); // oldest at freq=1
//! ```

use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::ds::slot_arena::{SlotArena, SlotId};

/// Link pointers first: they are touched on every promote/evict.
#[derive(Debug)]
#[repr(C)]
struct Entry<K> {
    prev: Option<SlotId>,
    next: Option<SlotId>,
    freq: u64,
    key: K,
}

#[derive(Debug, Default)]
struct Bucket {
    head: Option<SlotId>,
    tail: Option<SlotId>,
    prev: Option<u64>,
    next: Option<u64>,
}

/// O(1) LFU metadata tracker with FIFO tie-breaking within a frequency.
///
/// # Example
///
/// ```
/// use evictkit::ds::FrequencyBuckets;
///
/// let mut freq = FrequencyBuckets::new();
/// freq.insert("a");
/// freq.insert("b");
/// freq.touch(&"a");
///
/// assert_eq!(freq.frequency(&"a"), Some(2));
/// assert_eq!(freq.frequency(&"b"), Some(1));
/// assert_eq!(freq.min_freq(), Some(1));
///
/// let (key, count) = freq.pop_min().unwrap();
/// assert_eq!((key, count), ("b", 1));
/// ```
#[derive(Debug)]
pub struct FrequencyBuckets<K> {
    entries: SlotArena<Entry<K>>,
    index: FxHashMap<K, SlotId>,
    buckets: FxHashMap<u64, Bucket>,
    min_freq: u64,
}

impl<K> FrequencyBuckets<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty tracker with reserved space for `capacity` keys.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: SlotArena::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            buckets: FxHashMap::default(),
            min_freq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Current access count of `key`.
    pub fn frequency(&self, key: &K) -> Option<u64> {
        let id = self.index.get(key)?;
        self.entries.get(*id).map(|entry| entry.freq)
    }

    /// Lowest tracked frequency, `None` when empty.
    pub fn min_freq(&self) -> Option<u64> {
        (self.min_freq != 0).then_some(self.min_freq)
    }

    /// The eviction candidate without removing it.
    pub fn peek_min(&self) -> Option<(&K, u64)> {
        let id = self.buckets.get(&self.min_freq)?.tail?;
        self.entries.get(id).map(|entry| (&entry.key, entry.freq))
    }

    /// Bucket frequencies in sequence order (lowest first).
    pub fn frequencies(&self) -> Vec<u64> {
        let mut out = Vec::with_capacity(self.buckets.len());
        let mut current = self.min_freq();
        while let Some(freq) = current {
            out.push(freq);
            current = self.buckets.get(&freq).and_then(|bucket| bucket.next);
        }
        out
    }

    /// Keys at `freq`, oldest first (eviction order).
    pub fn bucket_keys(&self, freq: u64) -> Vec<&K> {
        let mut out = Vec::new();
        let mut current = self.buckets.get(&freq).and_then(|bucket| bucket.tail);
        while let Some(id) = current {
            let Some(entry) = self.entries.get(id) else {
                break;
            };
            out.push(&entry.key);
            current = entry.prev;
        }
        out
    }

    /// Starts tracking `key` at frequency 1. Returns `false` if already tracked.
    pub fn insert(&mut self, key: K) -> bool {
        self.insert_with_frequency(key, 1)
    }

    /// Starts tracking `key` at `freq` (at least 1), as the newest member of
    /// that bucket. Returns `false` if already tracked.
    ///
    /// O(1) at frequency 1; otherwise walks the bucket chain once to place a
    /// missing bucket.
    pub fn insert_with_frequency(&mut self, key: K, freq: u64) -> bool {
        if self.index.contains_key(&key) {
            return false;
        }

        let freq = freq.max(1);
        let id = self.entries.insert(Entry {
            prev: None,
            next: None,
            freq,
            key: key.clone(),
        });
        self.index.insert(key, id);

        if !self.buckets.contains_key(&freq) {
            let after = self.last_bucket_below(freq);
            self.open_bucket(freq, after);
        }
        self.attach_newest(freq, id);
        true
    }

    /// Increments the frequency of `key` and returns the new count.
    ///
    /// The key becomes the newest member of its new bucket. At `u64::MAX` the
    /// count stays put and the key only moves to the front of its bucket.
    /// Returns `None` if `key` is not tracked.
    pub fn touch(&mut self, key: &K) -> Option<u64> {
        let id = *self.index.get(key)?;
        let freq = self.entries.get(id)?.freq;
        let promoted = freq.saturating_add(1);

        self.detach(freq, id)?;
        if promoted != freq {
            if !self.buckets.contains_key(&promoted) {
                self.open_bucket(promoted, Some(freq));
            }
            if self.bucket_is_empty(freq) {
                self.close_bucket(freq);
            }
            self.entries.get_mut(id)?.freq = promoted;
        }
        self.attach_newest(promoted, id);
        Some(promoted)
    }

    /// Stops tracking `key`; returns its last frequency.
    pub fn remove(&mut self, key: &K) -> Option<u64> {
        let id = self.index.remove(key)?;
        let freq = self.entries.get(id)?.freq;
        self.release(freq, id)?;
        self.entries.remove(id).map(|entry| entry.freq)
    }

    /// Removes the oldest key in the lowest-frequency bucket.
    pub fn pop_min(&mut self) -> Option<(K, u64)> {
        let freq = self.min_freq()?;
        let id = self.buckets.get(&freq)?.tail?;
        self.release(freq, id)?;
        let entry = self.entries.remove(id)?;
        self.index.remove(&entry.key);
        Some((entry.key, entry.freq))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
        self.buckets.clear();
        self.min_freq = 0;
    }

    /// Unlinks `id` and drops its bucket if that left it empty.
    fn release(&mut self, freq: u64, id: SlotId) -> Option<()> {
        self.detach(freq, id)?;
        if self.bucket_is_empty(freq) {
            self.close_bucket(freq);
        }
        Some(())
    }

    fn bucket_is_empty(&self, freq: u64) -> bool {
        self.buckets
            .get(&freq)
            .is_none_or(|bucket| bucket.head.is_none())
    }

    /// Highest existing bucket frequency strictly below `freq`.
    fn last_bucket_below(&self, freq: u64) -> Option<u64> {
        let mut below = None;
        let mut cursor = self.min_freq();
        while let Some(current) = cursor.filter(|&current| current < freq) {
            below = Some(current);
            cursor = self.buckets.get(&current).and_then(|bucket| bucket.next);
        }
        below
    }

    /// Creates an empty bucket for `freq`, chained right after `after`
    /// (or at the front when `after` is `None`).
    fn open_bucket(&mut self, freq: u64, after: Option<u64>) {
        let next = match after {
            Some(after) => self.buckets.get(&after).and_then(|bucket| bucket.next),
            None => self.min_freq(),
        };
        self.buckets.insert(
            freq,
            Bucket {
                prev: after,
                next,
                ..Bucket::default()
            },
        );

        match after.and_then(|after| self.buckets.get_mut(&after)) {
            Some(bucket) => bucket.next = Some(freq),
            None => self.min_freq = freq,
        }
        if let Some(bucket) = next.and_then(|next| self.buckets.get_mut(&next)) {
            bucket.prev = Some(freq);
        }
    }

    /// Drops the bucket for `freq` and joins its neighbours.
    fn close_bucket(&mut self, freq: u64) {
        let Some(closed) = self.buckets.remove(&freq) else {
            return;
        };
        match closed.prev.and_then(|prev| self.buckets.get_mut(&prev)) {
            Some(bucket) => bucket.next = closed.next,
            None => self.min_freq = closed.next.unwrap_or(0),
        }
        if let Some(bucket) = closed.next.and_then(|next| self.buckets.get_mut(&next)) {
            bucket.prev = closed.prev;
        }
    }

    /// Pushes `id` at the head (newest end) of bucket `freq`.
    fn attach_newest(&mut self, freq: u64, id: SlotId) {
        let Some(bucket) = self.buckets.get_mut(&freq) else {
            return;
        };
        let old_head = bucket.head.replace(id);
        if old_head.is_none() {
            bucket.tail = Some(id);
        }
        if let Some(head) = old_head.and_then(|head| self.entries.get_mut(head)) {
            head.prev = Some(id);
        }
        if let Some(entry) = self.entries.get_mut(id) {
            entry.prev = None;
            entry.next = old_head;
        }
    }

    /// Takes `id` out of bucket `freq`, leaving the bucket in place.
    fn detach(&mut self, freq: u64, id: SlotId) -> Option<()> {
        let entry = self.entries.get_mut(id)?;
        let (prev, next) = (entry.prev.take(), entry.next.take());

        let bucket = self.buckets.get_mut(&freq)?;
        match prev.and_then(|prev| self.entries.get_mut(prev)) {
            Some(newer) => newer.next = next,
            None => bucket.head = next,
        }
        match next.and_then(|next| self.entries.get_mut(next)) {
            Some(older) => older.prev = prev,
            None => bucket.tail = prev,
        }
        Some(())
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        assert_eq!(self.len(), self.index.len());

        if self.is_empty() {
            assert!(self.buckets.is_empty());
            assert_eq!(self.min_freq, 0);
            return;
        }

        assert!(self.min_freq > 0);
        assert!(self.buckets.contains_key(&self.min_freq));

        let order = self.frequencies();
        assert_eq!(order.len(), self.buckets.len(), "bucket chain skips buckets");
        assert!(
            order.windows(2).all(|pair| pair[0] < pair[1]),
            "bucket chain not strictly increasing: {order:?}"
        );

        let mut seen = 0usize;
        for (&freq, bucket) in &self.buckets {
            assert!(bucket.head.is_some(), "empty bucket {freq} left behind");
            match bucket.prev {
                Some(prev) => assert_eq!(self.buckets[&prev].next, Some(freq)),
                None => assert_eq!(self.min_freq, freq),
            }
            if let Some(next) = bucket.next {
                assert_eq!(self.buckets[&next].prev, Some(freq));
            }

            let mut current = bucket.head;
            let mut last = None;
            while let Some(id) = current {
                let entry = self.entries.get(id).expect("bucket entry missing");
                assert_eq!(entry.freq, freq);
                assert_eq!(entry.prev, last);
                assert_eq!(self.index.get(&entry.key), Some(&id));
                last = Some(id);
                current = entry.next;
                seen += 1;
            }
            assert_eq!(bucket.tail, last);
        }
        assert_eq!(seen, self.len());
    }
}

impl<K> Default for FrequencyBuckets<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
