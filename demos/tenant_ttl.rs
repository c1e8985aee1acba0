//! Example demonstrating per-tenant caching with expiry and a background
//! sweep.
//!
//! Run with: RUST_LOG=evictkit=debug cargo run --example tenant_ttl

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use evictkit::builder::CacheBuilder;
use evictkit::durable::InMemoryDocumentStore;
use evictkit::traits::ConcurrentCache;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let builder = CacheBuilder::default()
        .ttl(Duration::from_millis(200))
        .gc_interval(Duration::from_millis(50));

    // Sharded: one namespace per tenant
    println!("=== Sharded TTL cache ===");
    let sessions = builder.build_sharded::<String, String, String>();
    let mut sweeper = sessions.start_sweep(builder.sweep_interval())?;

    sessions.set("acme".into(), "alice".into(), "token-a".into())?;
    sessions.set("acme".into(), "bob".into(), "token-b".into())?;
    sessions.set("globex".into(), "alice".into(), "token-c".into())?;
    println!("tenants: {}, entries: {}", sessions.tenant_count(), sessions.len());

    sessions.delete_shard(&"acme".to_string())?;
    println!("after delete_shard(acme): tenants {}", sessions.tenant_count());

    thread::sleep(Duration::from_millis(400));
    println!("after ttl: entries {}", sessions.len());
    sweeper.stop();

    // Durable: records with absolute expiry in a document store
    println!("\n=== Durable cache ===");
    let store = Arc::new(InMemoryDocumentStore::<String>::new());
    let durable = builder.build_durable(Arc::clone(&store))?;
    let _gc = durable.start_sweep()?;

    durable.set("greeting".to_string(), "hello".to_string())?;
    println!("greeting = {}", durable.get(&"greeting".to_string())?);
    println!("documents in {}: {}", durable.options().collection_name, store.len("jKeyValue"));

    thread::sleep(Duration::from_millis(400));
    println!(
        "after ttl: greeting found? {}",
        durable.get(&"greeting".to_string()).is_ok()
    );

    Ok(())
}
