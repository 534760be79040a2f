//! The seam a raster library's virtual filesystem (VSI-style) binding would
//! call into. Kept deliberately thin: the actual FFI/registration glue for a
//! specific binding (e.g. a GDAL plugin) lives outside this crate; this trait
//! is what that glue is written against.

use async_trait::async_trait;

use super::random_reader::MultiRangeReader;
use crate::error::CacheError;

/// Minimal surface a VSI-style plugin needs: open (nothing to do — the cache
/// has no per-key open state), sized positional reads, and a stat-style size
/// probe is deliberately left to the caller, since this crate's core does not
/// track upstream object sizes (see [`crate::io::SizeCache`] for that, kept
/// separate since not every `MultiRangeReader` wants it wired in).
#[async_trait]
pub trait VsiHandler: Send + Sync {
    /// Read `buf.len()` bytes of `key` at `offset`, VSI-style: returns the
    /// number of bytes actually read (short on end-of-object, same as the
    /// upstream contract this crate is built on).
    async fn vsi_read(&self, key: &str, buf: &mut [u8], offset: u64) -> Result<usize, CacheError>;

    /// Called when a raster library closes its handle to `key`. The default
    /// no-op is correct for this crate: the cache keeps blocks around under
    /// its own LRU policy regardless of how many VSI handles reference a key.
    fn vsi_close(&self, _key: &str) {}
}

#[async_trait]
impl<T: MultiRangeReader> VsiHandler for T {
    async fn vsi_read(&self, key: &str, buf: &mut [u8], offset: u64) -> Result<usize, CacheError> {
        let outcome = self.read_at(key, buf, offset).await?;
        Ok(outcome.bytes_written)
    }
}
