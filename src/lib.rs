//! evictkit: in-process caches with pluggable eviction, expiry and
//! persistence.
//!
//! ```text
//!                    ┌──────────────────────────────────────────┐
//!   callers ───────► │ Cache (&mut self) / ConcurrentCache      │
//!                    └──────────────────────────────────────────┘
//!                         │             │              │
//!              ┌──────────┘             │              └───────────┐
//!              ▼                        ▼                          ▼
//!   Synchronized / TtlCache     ShardedTtlCache             DurableCache
//!              │                        │                          │
//!              ▼                        ▼                          ▼
//!   LruCache / LfuCache / MemoryStore   ShardedStore         DocumentStore
//!              │
//!              ▼
//!   ds: IntrusiveList, FrequencyBuckets, SlotArena
//! ```
//!
//! Engines own values as `Arc<V>`, so a read hands out a cheap clone that
//! outlives the entry. Decorators hold their state behind one lock and can
//! run a background [`sweep::Sweeper`] that drops expired entries.

pub mod builder;
pub mod config;
pub mod ds;
pub mod durable;
pub mod error;
pub mod policy;
pub mod prelude;
pub mod store;
pub mod sweep;
pub mod traits;
