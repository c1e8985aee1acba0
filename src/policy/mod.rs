//! Eviction engines and the decorators layered over them.
//!
//! | Module          | Type               | Access      | Bounded by      |
//! |-----------------|--------------------|-------------|-----------------|
//! | [`lru`]         | `LruCache`         | `&mut self` | capacity        |
//! | [`lfu`]         | `LfuCache`         | `&mut self` | capacity        |
//! | [`ttl`]         | `TtlCache`         | both        | inner + expiry  |
//! | [`sharded`]     | `ShardedTtlCache`  | both        | expiry          |
//! | [`synchronized`]| `Synchronized`     | both        | inner           |

pub mod lfu;
pub mod lru;
pub mod sharded;
pub mod synchronized;
pub mod ttl;
