//! # rangecache
//!
//! A read-through, block-aligned, single-flight cache that sits between a
//! consumer doing arbitrary-offset byte reads and a high-latency keyed object
//! source (a remote object store accessed by key).
//!
//! It converts unaligned, possibly overlapping reads into aligned fixed-size
//! block fetches, coalesces concurrent misses for the same block so that at
//! most one upstream request is in flight per `(key, block)` at any time,
//! merges adjacent missing blocks into contiguous range requests, and fills
//! caller buffers from a shared block cache.
//!
//! ## Architecture
//!
//! Three cooperating components in [`io`], leaves first:
//!
//! - [`io::BlockStore`] — a bounded, LRU-evicted `(key, block_id) -> bytes` map.
//! - [`io::KeyedSingleFlight`] — a lock registry ensuring at most one upstream
//!   fetch per `(key, block_id)` is ever in flight.
//! - [`io::BlockCache`] — the orchestrator built on the two above, exposing
//!   [`io::MultiRangeReader`] over any [`io::RandomReader`] upstream.
//!
//! Ambient collaborators the core is built against in this crate:
//!
//! - [`io::SizeCache`] — remembers known-absent/known-size keys.
//! - [`io::S3ObjectReader`] — an S3-compatible [`io::RandomReader`].
//! - [`io::VsiHandler`] — the seam a raster library's VFS binding calls into.
//! - [`config`] — CLI/environment configuration for the demonstration binary.
//!
//! ## Example
//!
//! ```no_run
//! use rangecache::io::{BlockCache, BlockStore, MultiRangeReader, S3ObjectReader, create_s3_client};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = create_s3_client(None, "us-east-1").await;
//!     let upstream = S3ObjectReader::new(client, "my-bucket".to_string());
//!     let store = BlockStore::new(256)?;
//!     let cache = BlockCache::new(upstream, 0, store, false);
//!
//!     let mut buf = [0u8; 4096];
//!     let outcome = cache.read_at("objects/sample.bin", &mut buf, 0).await?;
//!     println!("read {} bytes, eof={}", outcome.bytes_written, outcome.end_of_object);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod io;

pub use config::Config;
pub use error::{CacheError, ConfigError};
pub use io::{
    create_s3_client, BlockCache, BlockStore, KeyedSingleFlight, KnownSize, MultiRangeOutcome,
    MultiRangeReader, RandomReader, RangeOutcome, S3ObjectReader, SizeCache, VsiHandler,
    DEFAULT_BLOCK_SIZE,
};
