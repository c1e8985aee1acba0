// ==============================================
// CONCURRENCY TESTS (integration)
// ==============================================
//
// Many threads against the shared-access engines. Set `RUST_LOG=evictkit=debug`
// to watch sweep activity.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Once};
use std::thread;
use std::time::Duration;

use evictkit::builder::{CacheBuilder, CachePolicy};
use evictkit::policy::sharded::ShardedTtlCache;
use evictkit::traits::ConcurrentCache;
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

const THREADS: usize = 8;
const OPS_PER_THREAD: usize = 2_000;

fn run_workers<F>(work: F)
where
    F: Fn(usize) + Send + Sync + 'static,
{
    let work = Arc::new(work);
    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|thread_id| {
            let work = Arc::clone(&work);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                work(thread_id);
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker panicked");
    }
}

mod synchronized {
    use super::*;

    #[test]
    fn test_mixed_workload_keeps_capacity() {
        init_tracing();
        for policy in [CachePolicy::Lru, CachePolicy::Lfu] {
            let cache = Arc::new(
                CacheBuilder::new(128)
                    .policy(policy)
                    .build_synchronized::<usize, usize>()
                    .unwrap(),
            );
            let worker_cache = Arc::clone(&cache);
            run_workers(move |thread_id| {
                for i in 0..OPS_PER_THREAD {
                    let key = (thread_id * 7919 + i) % 512;
                    match i % 4 {
                        0 | 1 => ConcurrentCache::set(&*worker_cache, key, i).unwrap(),
                        2 => {
                            let _ = ConcurrentCache::get(&*worker_cache, &key);
                        },
                        _ => ConcurrentCache::delete(&*worker_cache, &key).unwrap(),
                    }
                }
            });

            let len = cache.with_lock(|inner| {
                use evictkit::traits::Cache;
                inner.len()
            });
            assert!(len <= 128, "{policy:?}: len {len} over capacity");
        }
    }

    #[test]
    fn test_set_nx_has_single_winner() {
        init_tracing();
        let cache = Arc::new(CacheBuilder::new(16).build_synchronized::<u32, usize>().unwrap());
        let winners = Arc::new(AtomicUsize::new(0));
        let (worker_cache, worker_winners) = (Arc::clone(&cache), Arc::clone(&winners));
        run_workers(move |thread_id| {
            if ConcurrentCache::set_nx(&*worker_cache, 7, thread_id).unwrap() {
                worker_winners.fetch_add(1, Ordering::SeqCst);
            }
        });
        assert_eq!(winners.load(Ordering::SeqCst), 1);
    }
}

mod ttl {
    use super::*;

    #[test]
    fn test_foreground_ops_race_background_sweep() {
        init_tracing();
        let cache = Arc::new(
            CacheBuilder::new(256)
                .ttl(Duration::from_millis(5))
                .build_ttl::<usize, usize>()
                .unwrap(),
        );
        let mut sweeper = cache.start_sweep(Duration::from_millis(1)).unwrap();

        let worker_cache = Arc::clone(&cache);
        run_workers(move |thread_id| {
            for i in 0..OPS_PER_THREAD {
                let key = thread_id * OPS_PER_THREAD + i;
                ConcurrentCache::set(&*worker_cache, key, i).unwrap();
                if let Ok(value) = ConcurrentCache::get(&*worker_cache, &key) {
                    assert_eq!(*value, i);
                }
            }
        });

        sweeper.stop();
        assert!(cache.len() <= 256);
    }
}

mod sharded {
    use super::*;

    #[test]
    fn test_tenants_are_isolated_under_contention() {
        init_tracing();
        let cache: Arc<ShardedTtlCache<usize, usize, usize>> =
            Arc::new(ShardedTtlCache::new(Duration::from_secs(60)));
        let worker_cache = Arc::clone(&cache);
        run_workers(move |tenant| {
            for i in 0..OPS_PER_THREAD {
                worker_cache.set(tenant, i, tenant).unwrap();
            }
            for i in 0..OPS_PER_THREAD {
                assert_eq!(*worker_cache.get(&tenant, &i).unwrap(), tenant);
            }
        });

        assert_eq!(cache.tenant_count(), THREADS);
        assert_eq!(cache.len(), THREADS * OPS_PER_THREAD);

        let dropper = Arc::clone(&cache);
        run_workers(move |tenant| {
            if tenant % 2 == 0 {
                dropper.delete_shard(&tenant).unwrap();
            }
        });
        assert_eq!(cache.tenant_count(), THREADS / 2);
        assert_eq!(cache.len(), THREADS / 2 * OPS_PER_THREAD);
    }
}
