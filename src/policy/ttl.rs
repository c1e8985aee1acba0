//! # TTL (Time To Live) Decorator
//!
//! Adds expiry to any [`Cache`] engine. Every `set` stamps the key with the
//! current [`Instant`]; a key is expired once `now - set_at >= ttl`. Expired
//! keys are dropped lazily on read, and optionally by a background sweep.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                        TtlCache<K, V, C>                             │
//!   │                                                                      │
//!   │   Arc<Mutex<TtlState>> ◄───────── Weak ───────── Sweeper thread      │
//!   │         │                                                            │
//!   │         ▼                                                            │
//!   │   ┌─────────────────────────┐   ┌────────────────────────────────┐   │
//!   │   │ inner: C                │   │ set_at: FxHashMap<K, Instant>  │   │
//!   │   │ (LruCache, LfuCache,    │   │                                │   │
//!   │   │  MemoryStore, ...)      │   │ "a" → t0   "b" → t1            │   │
//!   │   └─────────────────────────┘   └────────────────────────────────┘   │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The inner engine may evict a key on its own (capacity), leaving a stale
//! `set_at` entry behind. Reads drop it when they find the inner entry gone,
//! the sweep prunes all of them, and `set` prunes them once they outnumber
//! live keys.
//!
//! ## Expiry Rules
//!
//! | `ttl`   | Behaviour                                   |
//! |---------|---------------------------------------------|
//! | `0`     | Never expires; only the inner engine evicts |
//! | `> 0`   | Expired iff `now - set_at >= ttl`           |
//!
//! ## Example Usage
//!
//! ```
//! use std::time::Duration;
//!
//! use evictkit::policy::lru::LruCache;
//! use evictkit::policy::ttl::TtlCache;
//! use evictkit::traits::ConcurrentCache;
//!
//! let cache = TtlCache::new(LruCache::new(100).unwrap(), Duration::from_millis(20));
//! cache.set("session", 42).unwrap();
//! assert_eq!(*cache.get(&"session").unwrap(), 42);
//!
//! std::thread::sleep(Duration::from_millis(40));
//! assert!(cache.get(&"session").unwrap_err().is_not_found());
//! ```
//!
//! ## Thread Safety
//!
//! All state sits behind one `parking_lot::Mutex`; foreground calls and sweep
//! ticks are mutually exclusive.

use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::ops::ControlFlow;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::error::CacheError;
use crate::sweep::Sweeper;
use crate::traits::{Cache, ConcurrentCache};

/// Minimum stale-metadata surplus before `set` prunes timing entries.
const PRUNE_SLACK: usize = 64;

struct TtlState<K, C> {
    inner: C,
    set_at: FxHashMap<K, Instant>,
}

#[inline]
fn is_expired(set_at: Instant, now: Instant, ttl: Duration) -> bool {
    !ttl.is_zero() && now.saturating_duration_since(set_at) >= ttl
}

impl<K, C> TtlState<K, C>
where
    K: Eq + Hash + Clone,
{
    fn is_live<V>(&self, key: &K, now: Instant, ttl: Duration) -> bool
    where
        C: Cache<K, V>,
    {
        self.inner.contains(key)
            && self
                .set_at
                .get(key)
                .is_none_or(|&at| !is_expired(at, now, ttl))
    }

    fn get<V>(&mut self, key: &K, ttl: Duration) -> Result<Arc<V>, CacheError>
    where
        C: Cache<K, V>,
    {
        if !self.inner.contains(key) {
            self.set_at.remove(key);
            return Err(CacheError::NotFound);
        }
        if let Some(&at) = self.set_at.get(key)
            && is_expired(at, Instant::now(), ttl)
        {
            self.inner.delete(key)?;
            self.set_at.remove(key);
            return Err(CacheError::NotFound);
        }
        self.inner.get(key)
    }

    fn set<V>(&mut self, key: K, value: V) -> Result<(), CacheError>
    where
        C: Cache<K, V>,
    {
        self.inner.set(key.clone(), value)?;
        self.set_at.insert(key, Instant::now());

        let live = self.inner.len();
        if self.set_at.len() > live.saturating_mul(2) + PRUNE_SLACK {
            self.prune_stale::<V>();
        }
        Ok(())
    }

    fn set_nx<V>(&mut self, key: K, value: V, ttl: Duration) -> Result<bool, CacheError>
    where
        C: Cache<K, V>,
    {
        if self.is_live::<V>(&key, Instant::now(), ttl) {
            return Ok(false);
        }
        if self.inner.contains(&key) {
            self.inner.delete(&key)?;
        }
        self.set(key, value)?;
        Ok(true)
    }

    fn delete<V>(&mut self, key: &K) -> Result<(), CacheError>
    where
        C: Cache<K, V>,
    {
        self.inner.delete(key)?;
        self.set_at.remove(key);
        Ok(())
    }

    /// Drops timing entries for keys the inner engine already evicted.
    fn prune_stale<V>(&mut self) -> usize
    where
        C: Cache<K, V>,
    {
        let before = self.set_at.len();
        let inner = &self.inner;
        self.set_at.retain(|key, _| inner.contains(key));
        before - self.set_at.len()
    }

    /// Removes every expired key; returns how many were removed.
    fn sweep<V>(&mut self, ttl: Duration) -> Result<usize, CacheError>
    where
        C: Cache<K, V>,
    {
        let pruned = self.prune_stale::<V>();
        if ttl.is_zero() {
            return Ok(0);
        }

        let now = Instant::now();
        let expired: Vec<K> = self
            .set_at
            .iter()
            .filter(|&(_, &at)| is_expired(at, now, ttl))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            self.inner.delete(key)?;
            self.set_at.remove(key);
        }
        trace!(expired = expired.len(), pruned, "ttl sweep tick");
        Ok(expired.len())
    }
}

/// Expiry decorator over any [`Cache`] engine.
pub struct TtlCache<K, V, C> {
    state: Arc<Mutex<TtlState<K, C>>>,
    ttl: Duration,
    _values: PhantomData<fn() -> V>,
}

impl<K, V, C> TtlCache<K, V, C>
where
    K: Eq + Hash + Clone,
    C: Cache<K, V>,
{
    /// Wraps `inner`; a zero `ttl` means entries never expire.
    pub fn new(inner: C, ttl: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(TtlState {
                inner,
                set_at: FxHashMap::default(),
            })),
            ttl,
            _values: PhantomData,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Entries held by the inner engine, expired or not.
    pub fn len(&self) -> usize {
        self.state.lock().inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` if `key` is present and not expired. Does not touch recency.
    pub fn contains(&self, key: &K) -> bool {
        self.state.lock().is_live::<V>(key, Instant::now(), self.ttl)
    }

    /// Runs one sweep now, on the caller's thread.
    pub fn purge_expired(&self) -> Result<usize, CacheError> {
        self.state.lock().sweep::<V>(self.ttl)
    }

    /// Runs `f` against the inner engine under the lock.
    pub fn with_inner<R>(&self, f: impl FnOnce(&C) -> R) -> R {
        f(&self.state.lock().inner)
    }

    /// Starts a background sweep every `interval`.
    ///
    /// A zero `interval` returns an idle handle. The sweep holds only a weak
    /// reference, so it ends by itself once this cache is dropped.
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use evictkit::policy::lru::LruCache;
    /// use evictkit::policy::ttl::TtlCache;
    /// use evictkit::traits::ConcurrentCache;
    ///
    /// let cache = TtlCache::new(LruCache::new(10).unwrap(), Duration::from_millis(10));
    /// let mut sweeper = cache.start_sweep(Duration::from_millis(5)).unwrap();
    ///
    /// cache.set(1, "one").unwrap();
    /// std::thread::sleep(Duration::from_millis(60));
    /// assert_eq!(cache.len(), 0); // removed without any read
    /// sweeper.stop();
    /// ```
    pub fn start_sweep(&self, interval: Duration) -> Result<Sweeper, CacheError>
    where
        K: Send + 'static,
        V: 'static,
        C: Send + 'static,
    {
        let weak: Weak<Mutex<TtlState<K, C>>> = Arc::downgrade(&self.state);
        let ttl = self.ttl;
        debug!(?ttl, ?interval, "starting ttl sweep");
        Sweeper::spawn("evictkit-ttl-sweep", interval, move || {
            let Some(state) = weak.upgrade() else {
                return ControlFlow::Break(());
            };
            let result = state.lock().sweep::<V>(ttl);
            match result {
                Ok(0) => {},
                Ok(removed) => debug!(removed, "ttl sweep removed expired entries"),
                Err(err) => debug!(error = %err, "ttl sweep failed"),
            }
            ControlFlow::Continue(())
        })
    }
}

impl<K, V, C> ConcurrentCache<K, V> for TtlCache<K, V, C>
where
    K: Eq + Hash + Clone + Send,
    C: Cache<K, V> + Send,
{
    fn get(&self, key: &K) -> Result<Arc<V>, CacheError> {
        self.state.lock().get(key, self.ttl)
    }

    fn set(&self, key: K, value: V) -> Result<(), CacheError> {
        self.state.lock().set(key, value)
    }

    fn delete(&self, key: &K) -> Result<(), CacheError> {
        self.state.lock().delete::<V>(key)
    }

    fn set_nx(&self, key: K, value: V) -> Result<bool, CacheError> {
        self.state.lock().set_nx(key, value, self.ttl)
    }
}

impl<K, V, C> Cache<K, V> for TtlCache<K, V, C>
where
    K: Eq + Hash + Clone,
    C: Cache<K, V>,
{
    fn get(&mut self, key: &K) -> Result<Arc<V>, CacheError> {
        self.state.lock().get(key, self.ttl)
    }

    fn set(&mut self, key: K, value: V) -> Result<(), CacheError> {
        self.state.lock().set(key, value)
    }

    fn delete(&mut self, key: &K) -> Result<(), CacheError> {
        self.state.lock().delete::<V>(key)
    }

    fn contains(&self, key: &K) -> bool {
        TtlCache::contains(self, key)
    }

    fn len(&self) -> usize {
        TtlCache::len(self)
    }

    fn set_nx(&mut self, key: K, value: V) -> Result<bool, CacheError> {
        self.state.lock().set_nx(key, value, self.ttl)
    }
}

impl<K, V, C> fmt::Debug for TtlCache<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
