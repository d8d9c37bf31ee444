use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;

/// Bounded memory of recently seen keys. A key counts as new again once its
/// TTL has lapsed without being seen.
pub struct DedupeCache<K> {
    ttl_ms: u64,
    cache: LruCache<K, u64>,
}

impl<K> DedupeCache<K>
where
    K: Hash + Eq,
{
    pub fn new(capacity: usize, ttl_ms: u64) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            ttl_ms,
            cache: LruCache::new(capacity),
        }
    }

    /// Returns `true` the first time `key` is observed within the TTL window.
    pub fn first_seen(&mut self, key: K, now_ms: u64) -> bool {
        let expires_at = now_ms.saturating_add(self.ttl_ms);
        match self.cache.get_mut(&key) {
            Some(current) if now_ms <= *current => {
                *current = expires_at;
                false
            }
            _ => {
                self.cache.put(key, expires_at);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
