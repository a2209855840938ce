//! The In-Flight Cache: a TTL-bounded, capacity-capped map from request ID to
//! "an executor has already taken responsibility for this". It is the sole
//! synchronization primitive preventing the same request from being relayed
//! twice by two concurrently ticking chains.
//!
//! Structurally this generalizes a circuit-breaker cooldown map: where a
//! circuit breaker tracks one cooldown per wallet, this tracks one TTL per
//! request ID, plus a capacity cap with FIFO eviction.

use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;
use std::time::{Duration, Instant};

use tracing::warn;

use crate::model::RequestId;

/// Default per-entry time-to-live.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

/// Default maximum number of tracked entries.
pub const DEFAULT_CAPACITY: usize = 1000;

#[derive(Debug)]
struct Inner {
    expires_at: HashMap<RequestId, Instant>,
    insertion_order: VecDeque<RequestId>,
}

/// Thread-safe TTL map used to prevent double-execution of the same request.
#[derive(Debug)]
pub struct InFlightCache {
    capacity: usize,
    inner: RwLock<Inner>,
}

impl Default for InFlightCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl InFlightCache {
    /// Create an empty cache with the given capacity cap.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: RwLock::new(Inner {
                expires_at: HashMap::new(),
                insertion_order: VecDeque::new(),
            }),
        }
    }

    /// Whether `id` is currently tracked and not expired.
    ///
    /// Expiration is checked lazily here rather than via a background sweep,
    /// per the module's no-sweep-required semantics.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn has(&self, id: RequestId) -> bool {
        let now = Instant::now();
        let mut inner = self.inner.write().unwrap();
        match inner.expires_at.get(&id) {
            Some(expiry) if *expiry > now => true,
            Some(_) => {
                inner.expires_at.remove(&id);
                false
            }
            None => false,
        }
    }

    /// Mark `id` as in-flight for `ttl`, evicting the oldest entry first if
    /// the cache is at capacity. Must be called by the Executor before its
    /// first on-chain side effect for this request.
    #[allow(clippy::unwrap_used)]
    pub fn set(&self, id: RequestId, ttl: Duration) {
        let mut inner = self.inner.write().unwrap();
        let is_new = !inner.expires_at.contains_key(&id);

        if is_new && inner.expires_at.len() >= self.capacity {
            while let Some(oldest) = inner.insertion_order.pop_front() {
                if inner.expires_at.remove(&oldest).is_some() {
                    warn!(request_id = %oldest, "in-flight cache at capacity, evicted oldest entry");
                    break;
                }
            }
        }

        inner.expires_at.insert(id, Instant::now() + ttl);
        if is_new {
            inner.insertion_order.push_back(id);
        }
    }

    /// Mark `id` as in-flight for the default 30s TTL.
    pub fn set_default(&self, id: RequestId) {
        self.set(id, DEFAULT_TTL);
    }

    /// Remove `id`, e.g. on irrecoverable trade failure so a later tick may retry.
    #[allow(clippy::unwrap_used)]
    pub fn delete(&self, id: RequestId) {
        self.inner.write().unwrap().expires_at.remove(&id);
    }

    /// Number of non-expired entries currently tracked.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.inner
            .read()
            .unwrap()
            .expires_at
            .values()
            .filter(|expiry| **expiry > now)
            .count()
    }

    /// Whether the cache is currently empty of non-expired entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::B256;

    fn id(byte: u8) -> RequestId {
        RequestId::from_bytes(B256::repeat_byte(byte))
    }

    #[test]
    fn set_then_has() {
        let cache = InFlightCache::default();
        assert!(!cache.has(id(1)));
        cache.set_default(id(1));
        assert!(cache.has(id(1)));
    }

    #[test]
    fn delete_removes_entry() {
        let cache = InFlightCache::default();
        cache.set_default(id(1));
        cache.delete(id(1));
        assert!(!cache.has(id(1)));
    }

    #[test]
    fn entry_expires_after_ttl() {
        let cache = InFlightCache::default();
        cache.set(id(1), Duration::from_millis(10));
        assert!(cache.has(id(1)));
        std::thread::sleep(Duration::from_millis(30));
        assert!(!cache.has(id(1)));
    }

    #[test]
    fn evicts_oldest_when_at_capacity() {
        let cache = InFlightCache::new(2);
        cache.set_default(id(1));
        cache.set_default(id(2));
        cache.set_default(id(3));

        assert!(!cache.has(id(1)), "oldest entry should have been evicted");
        assert!(cache.has(id(2)));
        assert!(cache.has(id(3)));
    }

    #[test]
    fn reinserting_existing_id_does_not_evict() {
        let cache = InFlightCache::new(2);
        cache.set_default(id(1));
        cache.set_default(id(2));
        cache.set_default(id(1));

        assert!(cache.has(id(1)));
        assert!(cache.has(id(2)));
    }
}
