//! The two boundary traits the cache sits between: a single-range upstream
//! reader it consumes, and a multi-range reader it exposes downstream.

use async_trait::async_trait;

use crate::error::CacheError;

/// The upstream interface the cache fetches through: a single positional read
/// over a keyed object.
///
/// Semantics match a Unix positional read: a short read (`n < buf.len()`) with
/// `Ok(n)` means end-of-object, not an error — there is no separate EOF error
/// kind at this boundary. Not-found keys surface as [`CacheError::NotFound`];
/// any other failure as [`CacheError::Upstream`]. The cache does not interpret
/// either; it propagates them.
#[async_trait]
pub trait RandomReader: Send + Sync {
    /// Read up to `buf.len()` bytes for `key` starting at `offset`, returning
    /// the number of bytes actually written into `buf`.
    async fn read_at(&self, key: &str, buf: &mut [u8], offset: u64) -> Result<usize, CacheError>;
}

/// Outcome of a single-range [`MultiRangeReader::read_at`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeOutcome {
    /// Number of bytes actually written into the caller's buffer (`0..=buf.len()`).
    pub bytes_written: usize,
    /// `true` iff `bytes_written < buf.len()`, i.e. the read hit the tail of the object.
    pub end_of_object: bool,
}

/// Outcome of a [`MultiRangeReader::read_at_multi`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiRangeOutcome {
    /// Per-range byte count, one entry per input buffer, in the same order.
    pub bytes_written: Vec<usize>,
    /// `true` iff any range was short (end-of-object was hit somewhere in the request).
    pub end_of_object: bool,
}

/// The downstream interface the cache exposes: arbitrary-offset, possibly
/// overlapping multi-range reads over keyed objects, plus purge controls.
#[async_trait]
pub trait MultiRangeReader: Send + Sync {
    /// Fill `buf` starting at upstream offset `off` within `key`.
    async fn read_at(&self, key: &str, buf: &mut [u8], off: u64) -> Result<RangeOutcome, CacheError>;

    /// Fill each `bufs[i]` starting at `offs[i]`, all within the same `key`.
    ///
    /// `bufs` and `offs` must have equal length; a mismatch is
    /// [`CacheError::InvalidArgument`].
    async fn read_at_multi(
        &self,
        key: &str,
        bufs: &mut [&mut [u8]],
        offs: &[u64],
    ) -> Result<MultiRangeOutcome, CacheError>;

    /// Drop every cached block belonging to `key`.
    async fn purge(&self, key: &str);

    /// Drop every cached block, regardless of key.
    async fn purge_all(&self);
}
