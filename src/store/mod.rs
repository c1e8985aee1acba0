//! Storage backends for cache policies.
//!
//! Stores own keys and values and answer lookups; policies own eviction
//! order and metadata. [`MemoryStore`] is the primitive every in-memory
//! engine builds on, [`ShardedStore`] adds a tenant level on top of it.

pub mod memory;
pub mod metrics;
pub mod sharded;

pub use memory::MemoryStore;
pub use metrics::StoreMetrics;
pub use sharded::ShardedStore;
