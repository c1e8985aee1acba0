// ==============================================
// TTL EXPIRY TESTS (integration)
// ==============================================
//
// Timing-based checks for the TTL decorator. Margins are generous so the
// tests hold on loaded CI machines.

use std::thread;
use std::time::Duration;

use evictkit::builder::{CacheBuilder, CachePolicy};
use evictkit::policy::lfu::LfuCache;
use evictkit::policy::lru::LruCache;
use evictkit::policy::ttl::TtlCache;
use evictkit::traits::ConcurrentCache;

const TTL: Duration = Duration::from_millis(100);

mod expiry {
    use super::*;

    #[test]
    fn test_entry_visible_before_and_gone_after_ttl() {
        let cache = TtlCache::new(LruCache::new(16).unwrap(), TTL);
        ConcurrentCache::set(&cache, "k", 1).unwrap();
        assert_eq!(*ConcurrentCache::get(&cache, &"k").unwrap(), 1);

        thread::sleep(TTL * 2);
        let err = ConcurrentCache::get(&cache, &"k").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_overwrite_restarts_clock() {
        let cache = TtlCache::new(LruCache::new(16).unwrap(), TTL);
        ConcurrentCache::set(&cache, "k", 1).unwrap();
        thread::sleep(TTL / 2);
        ConcurrentCache::set(&cache, "k", 2).unwrap();
        thread::sleep(TTL * 3 / 4);
        assert_eq!(*ConcurrentCache::get(&cache, &"k").unwrap(), 2);
    }

    #[test]
    fn test_reads_do_not_extend_lifetime() {
        let cache = TtlCache::new(LfuCache::new(16).unwrap(), TTL);
        ConcurrentCache::set(&cache, "k", 1).unwrap();
        for _ in 0..4 {
            thread::sleep(TTL / 4);
            let _ = ConcurrentCache::get(&cache, &"k");
        }
        thread::sleep(TTL / 2);
        assert!(ConcurrentCache::get(&cache, &"k").is_err());
    }

    #[test]
    fn test_set_nx_replaces_expired_entry() {
        let cache = TtlCache::new(LruCache::new(16).unwrap(), TTL);
        assert!(ConcurrentCache::set_nx(&cache, "k", 1).unwrap());
        assert!(!ConcurrentCache::set_nx(&cache, "k", 2).unwrap());

        thread::sleep(TTL * 2);
        assert!(ConcurrentCache::set_nx(&cache, "k", 3).unwrap());
        assert_eq!(*ConcurrentCache::get(&cache, &"k").unwrap(), 3);
    }

    #[test]
    fn test_zero_ttl_never_expires() {
        let cache = TtlCache::new(LruCache::new(16).unwrap(), Duration::ZERO);
        ConcurrentCache::set(&cache, "k", 1).unwrap();
        thread::sleep(Duration::from_millis(50));
        assert!(ConcurrentCache::get(&cache, &"k").is_ok());
        assert_eq!(cache.purge_expired().unwrap(), 0);
    }
}

mod eviction_and_expiry {
    use super::*;

    #[test]
    fn test_capacity_still_applies_under_ttl() {
        let cache = CacheBuilder::new(2)
            .policy(CachePolicy::Lru)
            .ttl(Duration::from_secs(60))
            .build_ttl::<u32, u32>()
            .unwrap();
        for i in 0..5 {
            ConcurrentCache::set(&cache, i, i).unwrap();
        }
        assert_eq!(cache.len(), 2);
        assert!(ConcurrentCache::get(&cache, &0).is_err());
        assert!(ConcurrentCache::get(&cache, &4).is_ok());
    }
}

mod background_sweep {
    use super::*;

    #[test]
    fn test_sweep_drops_expired_without_reads() {
        let cache = TtlCache::new(LruCache::new(64).unwrap(), Duration::from_millis(30));
        for i in 0..10u32 {
            ConcurrentCache::set(&cache, i, i).unwrap();
        }
        let mut sweeper = cache.start_sweep(Duration::from_millis(10)).unwrap();
        thread::sleep(Duration::from_millis(200));
        assert_eq!(cache.len(), 0);

        sweeper.stop();
        ConcurrentCache::set(&cache, 99, 99).unwrap();
        thread::sleep(Duration::from_millis(60));
        assert_eq!(cache.len(), 1, "no sweep after stop");
    }

    #[test]
    fn test_sweep_ends_when_cache_dropped() {
        let cache = TtlCache::new(LruCache::<u32, u32>::new(4).unwrap(), TTL);
        let sweeper = cache.start_sweep(Duration::from_millis(5)).unwrap();
        drop(cache);

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while sweeper.is_running() && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(!sweeper.is_running());
    }
}
