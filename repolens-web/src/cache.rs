//! Response cache for immutable GET endpoints
//!
//! Snapshots and analyses never change once stored, so a successful lookup can
//! be served again until its entry expires or is evicted.

use serde::Serialize;
use serde_json::Value;
use std::{
    collections::HashMap,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::{Duration, Instant},
};
use tracing::{debug, info};
use utoipa::ToSchema;

/// Cache entry with expiration
#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: Instant,
    access_count: u64,
    last_accessed: Instant,
}

impl CacheEntry {
    fn new(value: Value, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            value,
            expires_at: now + ttl,
            access_count: 0,
            last_accessed: now,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    fn access(&mut self, now: Instant) -> &Value {
        self.access_count += 1;
        self.last_accessed = now;
        &self.value
    }
}

/// JSON bodies keyed by request path, with TTL expiry and LRU eviction
#[derive(Debug)]
pub struct ResponseCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    max_entries: usize,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries: max_entries.max(1),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // A panic while holding the lock leaves the map itself intact
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, path: &str) -> Option<Value> {
        let now = Instant::now();
        let mut entries = self.write();

        match entries.get_mut(path) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(path);
                debug!(path = %path, "Cache entry expired and removed");
                None
            }
            Some(entry) => {
                debug!(path = %path, "Cache hit");
                Some(entry.access(now).clone())
            }
            None => {
                debug!(path = %path, "Cache miss");
                None
            }
        }
    }

    pub fn insert(&self, path: impl Into<String>, value: Value) {
        let path = path.into();
        let mut entries = self.write();

        if entries.len() >= self.max_entries && !entries.contains_key(&path) {
            Self::evict_lru(&mut entries);
        }

        entries.insert(path, CacheEntry::new(value, self.ttl));
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn clear(&self) {
        self.write().clear();
        info!("Response cache cleared");
    }

    /// Drop every expired entry and return how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.write();
        let initial_size = entries.len();

        entries.retain(|_, entry| !entry.is_expired(now));

        let removed = initial_size - entries.len();
        if removed > 0 {
            info!(removed, "🧹 Cache cleanup: removed expired entries");
        }
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let entries = self.read();

        CacheStats {
            total_entries: entries.len(),
            expired_entries: entries.values().filter(|e| e.is_expired(now)).count(),
            total_access_count: entries.values().map(|e| e.access_count).sum(),
            max_entries: self.max_entries,
        }
    }

    fn evict_lru(entries: &mut HashMap<String, CacheEntry>) {
        let lru_key = entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_accessed)
            .map(|(key, _)| key.clone());

        if let Some(key) = lru_key {
            entries.remove(&key);
            debug!(path = %key, "Evicted LRU cache entry");
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub total_access_count: u64,
    pub max_entries: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_returns_inserted_value() {
        let cache = ResponseCache::new(4, Duration::from_secs(60));
        cache.insert("/api/repository/1", json!({"id": 1}));

        assert_eq!(cache.get("/api/repository/1"), Some(json!({"id": 1})));
        assert_eq!(cache.get("/api/repository/2"), None);
        assert_eq!(cache.stats().total_access_count, 1);
    }

    #[test]
    fn test_expired_entries_are_not_served() {
        let cache = ResponseCache::new(4, Duration::ZERO);
        cache.insert("/api/analysis/1", json!({"id": 1}));

        assert_eq!(cache.get("/api/analysis/1"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_purge_expired() {
        let cache = ResponseCache::new(4, Duration::ZERO);
        cache.insert("/a", json!(1));
        cache.insert("/b", json!(2));

        assert_eq!(cache.stats().expired_entries, 2);
        assert_eq!(cache.purge_expired(), 2);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_least_recently_used_is_evicted() {
        let cache = ResponseCache::new(2, Duration::from_secs(60));
        cache.insert("/a", json!("a"));
        std::thread::sleep(Duration::from_millis(5));
        cache.insert("/b", json!("b"));
        std::thread::sleep(Duration::from_millis(5));

        // Touch /a so /b becomes the oldest
        assert!(cache.get("/a").is_some());
        cache.insert("/c", json!("c"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("/a").is_some());
        assert!(cache.get("/b").is_none());
        assert!(cache.get("/c").is_some());
    }

    #[test]
    fn test_reinserting_existing_key_does_not_evict() {
        let cache = ResponseCache::new(1, Duration::from_secs(60));
        cache.insert("/a", json!(1));
        cache.insert("/a", json!(2));

        assert_eq!(cache.get("/a"), Some(json!(2)));
    }
}
