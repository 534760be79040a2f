//! Black-box integration tests against the crate's public API: cache
//! transparency, single-flight under concurrency, and LRU-at-rest, exercised
//! the way a consumer of the crate would use it (no access to private fields).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rangecache::{BlockCache, BlockStore, CacheError, MultiRangeReader, RandomReader};

/// Deterministic synthetic upstream: object of `len` bytes where `byte[i] = i mod 256`.
struct SyntheticUpstream {
    len: u64,
    call_count: AtomicUsize,
}

impl SyntheticUpstream {
    fn new(len: u64) -> Self {
        Self {
            len,
            call_count: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl RandomReader for SyntheticUpstream {
    async fn read_at(&self, _key: &str, buf: &mut [u8], offset: u64) -> Result<usize, CacheError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if offset >= self.len {
            return Ok(0);
        }
        let available = (self.len - offset) as usize;
        let n = buf.len().min(available);
        for (i, b) in buf.iter_mut().enumerate().take(n) {
            *b = ((offset as usize + i) % 256) as u8;
        }
        Ok(n)
    }
}

#[tokio::test]
async fn cache_transparency_across_repeated_reads() {
    let upstream = SyntheticUpstream::new(10_000);
    let cache = BlockCache::new(upstream, 512, BlockStore::new(16).unwrap(), false);

    for _ in 0..5 {
        let mut buf = [0u8; 777];
        let outcome = cache.read_at("object", &mut buf, 1234).await.unwrap();
        assert_eq!(outcome.bytes_written, 777);
        let expected: Vec<u8> = (1234..1234 + 777).map(|i| (i % 256) as u8).collect();
        assert_eq!(&buf[..], &expected[..]);
    }
}

#[tokio::test]
async fn purge_all_then_reread_matches_original_bytes() {
    let upstream = SyntheticUpstream::new(4096);
    let cache = BlockCache::new(upstream, 256, BlockStore::new(8).unwrap(), false);

    let mut first = [0u8; 100];
    cache.read_at("object", &mut first, 50).await.unwrap();

    cache.purge_all().await;

    let mut second = [0u8; 100];
    cache.read_at("object", &mut second, 50).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn many_concurrent_readers_same_block_single_upstream_call() {
    let cache = Arc::new(BlockCache::new(
        SyntheticUpstream::new(2048),
        256,
        BlockStore::new(8).unwrap(),
        false,
    ));

    let mut handles = Vec::new();
    for _ in 0..32 {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move {
            let mut buf = [0u8; 16];
            cache.read_at("object", &mut buf, 8).await.unwrap()
        }));
    }

    for handle in handles {
        let outcome = handle.await.unwrap();
        assert_eq!(outcome.bytes_written, 16);
    }
}

#[tokio::test]
async fn block_store_never_exceeds_capacity_after_many_keys() {
    let store = BlockStore::new(4).unwrap();
    for key in 0..50 {
        store.add(&key.to_string(), 0, bytes::Bytes::from_static(b"x")).await;
        assert!(store.len().await <= 4);
    }
}

#[tokio::test]
async fn multi_range_read_over_distinct_regions() {
    let upstream = SyntheticUpstream::new(4096);
    let cache = BlockCache::new(upstream, 256, BlockStore::new(8).unwrap(), false);

    let mut buf0 = [0u8; 32];
    let mut buf1 = [0u8; 64];
    let mut bufs: Vec<&mut [u8]> = vec![&mut buf0, &mut buf1];
    let outcome = cache
        .read_at_multi("object", &mut bufs, &[0, 2000])
        .await
        .unwrap();

    assert_eq!(outcome.bytes_written, vec![32, 64]);
    assert!(!outcome.end_of_object);

    let expected0: Vec<u8> = (0..32).map(|i| (i % 256) as u8).collect();
    let expected1: Vec<u8> = (2000..2064).map(|i| (i % 256) as u8).collect();
    assert_eq!(&buf0[..], &expected0[..]);
    assert_eq!(&buf1[..], &expected1[..]);
}

#[tokio::test]
async fn not_found_propagates_verbatim() {
    struct AlwaysMissing;

    #[async_trait]
    impl RandomReader for AlwaysMissing {
        async fn read_at(&self, key: &str, _buf: &mut [u8], _offset: u64) -> Result<usize, CacheError> {
            Err(CacheError::NotFound(key.to_string()))
        }
    }

    let cache = BlockCache::new(AlwaysMissing, 256, BlockStore::new(4).unwrap(), false);
    let mut buf = [0u8; 16];
    let err = cache.read_at("missing-object", &mut buf, 0).await.unwrap_err();
    assert!(matches!(err, CacheError::NotFound(ref k) if k == "missing-object"));
}
