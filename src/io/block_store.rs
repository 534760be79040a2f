//! Bounded, LRU-evicted store of `(key, block_id) -> bytes` entries.
//!
//! This is the leaf component of the cache: it knows nothing about upstream
//! readers, block math, or single-flight coordination. It just remembers
//! blocks under a global capacity budget, shared across every key.

use std::num::NonZeroUsize;

use bytes::Bytes;
use lru::LruCache;
use tokio::sync::RwLock;

use crate::error::CacheError;

/// The LRU key: a block is identified by the object key it belongs to plus
/// its zero-based block index within that object.
type StoreKey = (String, u64);

/// Bounded associative container mapping `(key, block_id)` to a byte buffer.
///
/// A present entry with an empty buffer is a valid, distinct state from "not
/// cached": it records a confirmed end-of-object at that block. `get` returns
/// `Option<Bytes>`, so callers can tell the two apart (`Some(empty)` vs `None`).
///
/// Internally this is a single `RwLock<LruCache<..>>`: one async lock guarding
/// an `lru::LruCache`, read-heavy access going through `.read()`/`.write()` as
/// appropriate.
pub struct BlockStore {
    cache: RwLock<LruCache<StoreKey, Bytes>>,
}

impl BlockStore {
    /// Construct a store with room for `capacity` entries.
    ///
    /// `capacity` must be non-zero; a zero capacity is rejected rather than
    /// silently clamped, since a cache that can hold nothing is almost always
    /// a configuration mistake.
    pub fn new(capacity: usize) -> Result<Self, CacheError> {
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| {
            CacheError::InvalidArgument("block store capacity must be non-zero".to_string())
        })?;
        Ok(Self {
            cache: RwLock::new(LruCache::new(capacity)),
        })
    }

    /// Insert or replace the block at `(key, block_id)`, marking it most-recently-used.
    ///
    /// May evict the least-recently-used entry (possibly for a different key)
    /// to stay within capacity.
    pub async fn add(&self, key: &str, block_id: u64, data: Bytes) {
        let mut cache = self.cache.write().await;
        cache.put((key.to_string(), block_id), data);
    }

    /// Look up a block, marking it most-recently-used on hit.
    ///
    /// Returns `None` if the block has never been fetched or was evicted;
    /// returns `Some(Bytes::new())` if the block is a cached empty sentinel
    /// (confirmed end-of-object).
    pub async fn get(&self, key: &str, block_id: u64) -> Option<Bytes> {
        let mut cache = self.cache.write().await;
        cache.get(&(key.to_string(), block_id)).cloned()
    }

    /// Remove every entry belonging to `key`. Entries for other keys are untouched.
    pub async fn purge_key(&self, key: &str) {
        let mut cache = self.cache.write().await;
        let matching: Vec<StoreKey> = cache
            .iter()
            .filter(|((k, _), _)| k == key)
            .map(|(k, _)| k.clone())
            .collect();
        for store_key in matching {
            cache.pop(&store_key);
        }
    }

    /// Remove every entry, regardless of key.
    pub async fn purge_all(&self) {
        let mut cache = self.cache.write().await;
        cache.clear();
    }

    /// Current number of entries. Exposed for tests and metrics, not part of the
    /// cache's external read path.
    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }
}
