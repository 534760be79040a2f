//! Remembers whether a key is known-absent or has a known size, so repeated
//! lookups against a missing object (or repeated size queries) short-circuit
//! without a round trip to the upstream store.
//!
//! Shares the same LRU discipline as [`BlockStore`](super::BlockStore) but at
//! a smaller default scale, since entries here are a few bytes each rather
//! than whole blocks.

use std::num::NonZeroUsize;

use lru::LruCache;
use tokio::sync::RwLock;

use crate::error::CacheError;

/// What is known about a key's existence/size upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownSize {
    /// The key does not exist upstream (a prior lookup returned `NotFound`).
    Absent,
    /// The key exists and is `u64` bytes long.
    Size(u64),
}

/// Bounded LRU cache of `key -> KnownSize`.
pub struct SizeCache {
    cache: RwLock<LruCache<String, KnownSize>>,
}

impl SizeCache {
    pub fn new(capacity: usize) -> Result<Self, CacheError> {
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| {
            CacheError::InvalidArgument("size cache capacity must be non-zero".to_string())
        })?;
        Ok(Self {
            cache: RwLock::new(LruCache::new(capacity)),
        })
    }

    pub async fn get(&self, key: &str) -> Option<KnownSize> {
        let mut cache = self.cache.write().await;
        cache.get(key).copied()
    }

    pub async fn set(&self, key: &str, known: KnownSize) {
        let mut cache = self.cache.write().await;
        cache.put(key.to_string(), known);
    }

    pub async fn purge(&self, key: &str) {
        let mut cache = self.cache.write().await;
        cache.pop(key);
    }

    pub async fn purge_all(&self) {
        let mut cache = self.cache.write().await;
        cache.clear();
    }
}
