//! Cache Store Module
//!
//! Thread-safe key/value store combining HashMap storage with LRU tracking
//! and TTL expiration. All state sits behind one mutex; no operation does
//! I/O while holding it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::cache::{CacheConfig, CacheEntry, CacheStats, Clock, LruTracker, SystemClock};

// == Store State ==
#[derive(Debug)]
struct StoreState<V> {
    entries: HashMap<String, CacheEntry<V>>,
    lru: LruTracker,
    stats: CacheStats,
}

impl<V> StoreState<V> {
    fn remove(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.lru.remove(key);
        }
        removed
    }

    fn purge_expired(&mut self, now_ms: u64) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now_ms))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove(key);
        }
        self.stats.record_expirations(expired.len());
        expired.len()
    }
}

// == Cache Store ==
/// Time-bounded, size-bounded cache safe for concurrent callers.
///
/// Values are handed out as clones; wrap large payloads in an `Arc` to
/// make that cheap.
#[derive(Debug)]
pub struct CacheStore<V> {
    state: Mutex<StoreState<V>>,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates a store that reads wall-clock time.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a store that reads time from `clock`.
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(StoreState {
                entries: HashMap::new(),
                lru: LruTracker::new(),
                stats: CacheStats::new(),
            }),
            config,
            clock,
        }
    }

    pub fn config(&self) -> CacheConfig {
        self.config
    }

    fn lock(&self) -> MutexGuard<'_, StoreState<V>> {
        // State stays consistent between statements, so a panic elsewhere
        // while holding the lock leaves nothing half-written.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // == Get ==
    /// Returns the value if present and not expired.
    ///
    /// An expired entry is removed on the spot and reported as absent.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now_ms();
        let mut state = self.lock();

        let expired = match state.entries.get(key) {
            Some(entry) => entry.is_expired(now),
            None => {
                state.stats.record_miss();
                return None;
            }
        };

        if expired {
            state.remove(key);
            state.stats.record_expirations(1);
            state.stats.record_miss();
            return None;
        }

        state.lru.touch(key);
        state.stats.record_hit();
        state.entries.get(key).map(|entry| entry.value.clone())
    }

    // == Put ==
    /// Inserts or overwrites `key`, resetting its lifetime to the configured TTL.
    ///
    /// A new key arriving at capacity first drops expired entries, then the
    /// least recently used live entry if still full. Overwrites never evict.
    pub fn put(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let now = self.clock.now_ms();
        let mut state = self.lock();

        if !state.entries.contains_key(&key) && state.entries.len() >= self.config.max_entries() {
            state.purge_expired(now);
            if state.entries.len() >= self.config.max_entries() {
                if let Some(evicted) = state.lru.evict_oldest() {
                    state.entries.remove(&evicted);
                    state.stats.record_eviction();
                    debug!(key = %evicted, "evicted least recently used entry");
                }
            }
        }

        let entry = CacheEntry::new(value, now, self.config.ttl_seconds());
        state.entries.insert(key.clone(), entry);
        state.lru.touch(&key);
    }

    // == Invalidate ==
    /// Removes `key` if present.
    pub fn invalidate(&self, key: &str) {
        self.lock().remove(key);
    }

    // == Clear ==
    /// Removes every entry. Counters are kept.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.lru.clear();
    }

    // == Purge Expired ==
    /// Removes all expired entries, returning how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now_ms();
        self.lock().purge_expired(now)
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        let mut stats = state.stats.clone();
        stats.set_total_entries(state.entries.len());
        stats
    }

    // == Length ==
    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = self.clock.now_ms();
        self.lock()
            .entries
            .values()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `key` is held live, without touching LRU order or counters.
    pub fn contains(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        self.lock()
            .entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }
}
