//! Arena-backed building blocks for the policy engines.
//!
//! Everything here is single-threaded and addresses entries through stable
//! [`SlotId`] handles instead of pointers.

pub mod frequency_buckets;
pub mod intrusive_list;
pub mod slot_arena;

pub use frequency_buckets::FrequencyBuckets;
pub use intrusive_list::IntrusiveList;
pub use slot_arena::{SlotArena, SlotId};
