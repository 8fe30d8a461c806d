use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Concurrent per-symbol cache with a fixed time-to-live.
///
/// Keys are symbols and are compared case-insensitively. A zero TTL turns
/// the cache off: inserts are dropped and every lookup misses.
pub struct Cache<V> {
    entries: DashMap<String, Entry<V>>,
    ttl: Duration,
}

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

fn key(symbol: &str) -> String {
    symbol.trim().to_lowercase()
}

impl<V: Clone> Cache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Fresh value for `symbol`. Expired entries are evicted on the way out.
    pub fn get(&self, symbol: &str) -> Option<V> {
        let key = key(symbol);
        let entry = self.entries.get(&key)?;
        if entry.expires_at > Instant::now() {
            return Some(entry.value.clone());
        }
        drop(entry);
        self.entries.remove(&key);
        None
    }

    pub fn insert(&self, symbol: &str, value: V) {
        if !self.is_enabled() {
            return;
        }
        self.entries.insert(
            key(symbol),
            Entry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.entries.len())
    }

    /// Number of stored entries, expired ones included until purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_ignore_case() {
        let cache = Cache::new(Duration::from_secs(60));
        cache.insert("BTC", 1);
        assert_eq!(cache.get("btc"), Some(1));
        assert_eq!(cache.get(" Btc "), Some(1));
        assert_eq!(cache.get("eth"), None);
    }

    #[test]
    fn test_expired_entry_is_evicted() {
        let cache = Cache::new(Duration::from_millis(10));
        cache.insert("btc", "report".to_string());
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.get("btc"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_ttl_disables_cache() {
        let cache = Cache::new(Duration::ZERO);
        assert!(!cache.is_enabled());
        cache.insert("btc", 1);
        assert_eq!(cache.get("btc"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_insert_overwrites() {
        let cache = Cache::new(Duration::from_secs(60));
        cache.insert("eth", 1);
        cache.insert("ETH", 2);
        assert_eq!(cache.get("eth"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_purge_expired_counts_removed() {
        let cache = Cache::new(Duration::from_millis(10));
        cache.insert("btc", 1);
        cache.insert("eth", 2);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.purge_expired(), 2);
        assert!(cache.is_empty());
    }
}
