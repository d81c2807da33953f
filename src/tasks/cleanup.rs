//! Expiry sweep task
//!
//! Lookups already drop expired entries lazily. The sweep bounds how long
//! an expired entry that is never looked up again keeps its slot.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheStore;

/// Spawns a task that calls [`CacheStore::purge_expired`] every `interval`.
///
/// The task runs until aborted through the returned handle.
pub fn spawn_cleanup_task<V>(cache: Arc<CacheStore<V>>, interval: Duration) -> JoinHandle<()>
where
    V: Clone + Send + 'static,
{
    tokio::spawn(async move {
        info!(interval_secs = interval.as_secs(), "starting cache expiry sweep");

        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let removed = cache.purge_expired();
            if removed > 0 {
                info!(removed, "expiry sweep removed entries");
            } else {
                debug!("expiry sweep found nothing to remove");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheConfig, ManualClock};

    fn cache_with_clock(ttl: u64) -> (Arc<CacheStore<String>>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(0));
        let config = CacheConfig::new(ttl, 100).unwrap();
        let cache = Arc::new(CacheStore::with_clock(config, clock.clone()));
        (cache, clock)
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_removes_expired_entries() {
        let (cache, clock) = cache_with_clock(1);
        cache.put("getCommittees?biennium=2025-26", "committees".to_string());

        let handle = spawn_cleanup_task(Arc::clone(&cache), Duration::from_secs(1));

        clock.advance(Duration::from_secs(2));
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(cache.stats().expirations, 1);
        assert_eq!(cache.stats().total_entries, 0);
        // Removed by the sweep, not by a lookup.
        assert_eq!(cache.stats().misses, 0);

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_preserves_live_entries() {
        let (cache, clock) = cache_with_clock(3600);
        cache.put("findLegislator?biennium=2025-26", "members".to_string());

        let handle = spawn_cleanup_task(Arc::clone(&cache), Duration::from_secs(1));

        clock.advance(Duration::from_secs(60));
        tokio::time::sleep(Duration::from_millis(2500)).await;

        assert_eq!(cache.get("findLegislator?biennium=2025-26").as_deref(), Some("members"));
        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_can_be_aborted() {
        let (cache, _clock) = cache_with_clock(300);
        let handle = spawn_cleanup_task(cache, Duration::from_secs(1));

        handle.abort();
        let result = handle.await;
        assert!(result.unwrap_err().is_cancelled());
    }
}
