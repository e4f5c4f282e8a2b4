use crate::cache::{CacheEntry, FlagCache};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Process-local [`FlagCache`]. Expired entries are evicted when they're read.
#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl InMemoryCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }
}

impl FlagCache for InMemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().ok()?;
        if entries.get(key)?.is_expired(Utc::now().timestamp_millis()) {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|entry| entry.value.clone())
    }

    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_owned(), CacheEntry::new(value, ttl));
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}

#[cfg(test)]
mod memory_cache_tests {
    use crate::{FlagCache, InMemoryCache};
    use std::time::Duration;

    #[test]
    fn missing_key() {
        let cache = InMemoryCache::new();
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.get_or("k", "fallback"), "fallback");
    }

    #[test]
    fn set_and_remove() {
        let cache = InMemoryCache::new();
        cache.set("k", "v1", None);
        assert_eq!(cache.get("k").as_deref(), Some("v1"));

        cache.set("k", "v2", None);
        assert_eq!(cache.get("k").as_deref(), Some("v2"));

        cache.remove("k");
        assert_eq!(cache.get("k"), None);
        cache.remove("k");
    }

    #[test]
    fn ttl() {
        let cache = InMemoryCache::new();
        cache.set("short", "v", Some(Duration::from_secs(1)));
        cache.set("forever", "v", None);
        assert_eq!(cache.get("short").as_deref(), Some("v"));

        std::thread::sleep(Duration::from_millis(1100));

        assert_eq!(cache.get("short"), None);
        assert_eq!(cache.get("forever").as_deref(), Some("v"));
    }

    #[test]
    fn set_refreshes_ttl() {
        let cache = InMemoryCache::new();
        cache.set("k", "v1", Some(Duration::from_secs(1)));
        std::thread::sleep(Duration::from_millis(600));
        cache.set("k", "v2", Some(Duration::from_secs(1)));
        std::thread::sleep(Duration::from_millis(600));

        assert_eq!(cache.get("k").as_deref(), Some("v2"));
    }

    #[test]
    fn set_without_ttl_clears_expiry() {
        let cache = InMemoryCache::new();
        cache.set("k", "v1", Some(Duration::from_millis(100)));
        cache.set("k", "v2", None);
        std::thread::sleep(Duration::from_millis(200));

        assert_eq!(cache.get("k").as_deref(), Some("v2"));
    }
}
