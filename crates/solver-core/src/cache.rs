//! Generic TTL cache backing the gas-price (30s) and price-oracle (60s)
//! lookups the v2 evaluator makes every tick. Process-wide and safe for
//! concurrent read/write, per the shared-resource policy these caches fall
//! under.

use std::hash::Hash;
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// A `(value, inserted_at)` pair with a fixed TTL checked on read.
#[derive(Debug)]
struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// Process-wide, TTL-bounded cache keyed by `K`.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: DashMap<K, Entry<V>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a cache whose entries expire `ttl` after insertion.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    /// Return the cached value for `key` if present and not expired.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        let entry = self.entries.get(key)?;
        if entry.inserted_at.elapsed() > self.ttl {
            drop(entry);
            self.entries.remove(key);
            return None;
        }
        Some(entry.value.clone())
    }

    /// Insert or refresh `key`'s cached value.
    pub fn insert(&self, key: K, value: V) {
        self.entries.insert(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Fetch `key`, computing and caching a fresh value via `compute` on a miss.
    pub fn get_or_insert_with(&self, key: K, compute: impl FnOnce() -> V) -> V {
        if let Some(value) = self.get(&key) {
            return value;
        }
        let value = compute();
        self.insert(key.clone(), value.clone());
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caches_and_expires() {
        let cache: TtlCache<&str, u64> = TtlCache::new(Duration::from_millis(10));
        cache.insert("a", 1);
        assert_eq!(cache.get(&"a"), Some(1));
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(cache.get(&"a"), None);
    }

    #[test]
    fn get_or_insert_with_only_computes_once() {
        let cache: TtlCache<&str, u64> = TtlCache::new(Duration::from_secs(60));
        let mut calls = 0;
        let mut compute = || {
            calls += 1;
            42
        };
        assert_eq!(cache.get_or_insert_with("a", &mut compute), 42);
        assert_eq!(cache.get_or_insert_with("a", &mut compute), 42);
        assert_eq!(calls, 1);
    }
}
