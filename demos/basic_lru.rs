//! Example demonstrating the bounded engines through the builder.
//!
//! Run with: cargo run --example basic_lru

use evictkit::builder::{CacheBuilder, CachePolicy};
use evictkit::traits::Cache;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Bounded Engines ===\n");

    // Example 1: LRU
    println!("1. LRU Cache");
    let mut lru = CacheBuilder::new(3).build::<u64, String>()?;

    lru.set(1, "one".to_string())?;
    lru.set(2, "two".to_string())?;
    lru.set(3, "three".to_string())?;

    // Read key 1 so key 2 becomes least recent
    lru.get(&1)?;

    // Set key 4, evicts key 2
    lru.set(4, "four".to_string())?;

    println!("   contains 1? {} (was read)", lru.contains(&1));
    println!("   contains 2? {} (evicted as LRU)", lru.contains(&2));
    println!("   contains 4? {} (just set)", lru.contains(&4));
    println!();

    // Example 2: LFU
    println!("2. LFU Cache");
    let mut lfu = CacheBuilder::new(3)
        .policy(CachePolicy::Lfu)
        .build::<u64, String>()?;

    lfu.set(1, "one".to_string())?;
    lfu.set(2, "two".to_string())?;
    lfu.set(3, "three".to_string())?;

    // Key 1 read three times, key 3 once
    for _ in 0..3 {
        lfu.get(&1)?;
    }
    lfu.get(&3)?;

    // Set key 4, evicts key 2 (lowest frequency)
    lfu.set(4, "four".to_string())?;

    println!("   contains 1? {} (hot)", lfu.contains(&1));
    println!("   contains 2? {} (evicted as LFU)", lfu.contains(&2));
    println!();

    // Example 3: set_nx
    println!("3. Set if absent");
    let first = lru.set_nx(9, "nine".to_string())?;
    let second = lru.set_nx(9, "NINE".to_string())?;
    println!("   first set_nx: {first}, second set_nx: {second}");
    println!("   value: {}", lru.get(&9)?);

    // Misses are errors you can match on
    match lru.get(&42) {
        Err(err) if err.is_not_found() => println!("   key 42: not found"),
        other => println!("   key 42: {other:?}"),
    }

    Ok(())
}
