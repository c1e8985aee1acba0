pub use crate::builder::{CacheBuilder, CachePolicy, PolicyCache};
pub use crate::config::CacheConfig;
pub use crate::durable::{
    DocumentStore, DurableCache, DurableOptions, InMemoryDocumentStore, KeyValueRecord,
};
pub use crate::error::{CacheError, ConfigError};
pub use crate::policy::lfu::LfuCache;
pub use crate::policy::lru::LruCache;
pub use crate::policy::sharded::ShardedTtlCache;
pub use crate::policy::synchronized::Synchronized;
pub use crate::policy::ttl::TtlCache;
pub use crate::store::{MemoryStore, ShardedStore, StoreMetrics};
pub use crate::sweep::Sweeper;
pub use crate::traits::{Cache, ConcurrentCache};
