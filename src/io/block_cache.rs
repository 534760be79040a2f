//! The orchestrator: block-aligns incoming ranges, consults the [`BlockStore`],
//! coalesces misses through [`KeyedSingleFlight`], issues merged or split range
//! reads to the upstream [`RandomReader`], and fills caller buffers.
//!
//! This is the hard part of the crate; the rest of `io` exists to support it.

use std::collections::{BTreeSet, HashMap};

use bytes::Bytes;
use futures::future::join_all;
use tracing::{debug, trace, warn};

use super::block_store::BlockStore;
use super::random_reader::{MultiRangeOutcome, MultiRangeReader, RandomReader, RangeOutcome};
use super::singleflight::KeyedSingleFlight;
use crate::error::CacheError;

/// Default block size: 64 KiB, used whenever `block_size == 0` is passed to a
/// constructor.
pub const DEFAULT_BLOCK_SIZE: u64 = 64 * 1024;

/// Read-through, block-aligned, single-flight cache over a keyed
/// [`RandomReader`], itself exposed downstream as a [`MultiRangeReader`].
pub struct BlockCache<R> {
    upstream: R,
    block_size: u64,
    store: BlockStore,
    single_flight: KeyedSingleFlight,
    /// `true`: one upstream request per missing block, fully parallel.
    /// `false` (default): missing blocks are merged into contiguous runs first.
    split_ranges: bool,
}

impl<R: RandomReader> BlockCache<R> {
    /// Construct a cache with the default single-flight registry.
    ///
    /// `block_size == 0` falls back to [`DEFAULT_BLOCK_SIZE`].
    pub fn new(upstream: R, block_size: u64, store: BlockStore, split_ranges: bool) -> Self {
        Self::with_single_flight(upstream, block_size, store, split_ranges, KeyedSingleFlight::new())
    }

    /// Construct a cache with a caller-supplied [`KeyedSingleFlight`], so tests
    /// can inspect or pre-seed lock state.
    pub fn with_single_flight(
        upstream: R,
        block_size: u64,
        store: BlockStore,
        split_ranges: bool,
        single_flight: KeyedSingleFlight,
    ) -> Self {
        let block_size = if block_size == 0 {
            DEFAULT_BLOCK_SIZE
        } else {
            block_size
        };
        Self {
            upstream,
            block_size,
            store,
            single_flight,
            split_ranges,
        }
    }

    fn lock_name(key: &str, block_id: u64) -> String {
        format!("{key}-{block_id}")
    }

    /// Touched block ids `[start, end]` (inclusive) for a range of `len` bytes
    /// starting at `off`. `len == 0` touches nothing.
    fn touched_blocks(&self, off: u64, len: usize) -> Option<(u64, u64)> {
        if len == 0 {
            return None;
        }
        let start = off / self.block_size;
        let end = (off + len as u64 - 1) / self.block_size;
        Some((start, end))
    }

    /// Copy the overlap between `block` (aligned at `block_id * block_size`)
    /// and the caller range `[off, off + buf.len())` into `buf`, returning the
    /// number of bytes copied.
    fn apply_block(&self, buf: &mut [u8], off: u64, block_id: u64, block: &Bytes) -> usize {
        let block_start = block_id * self.block_size;
        let block_nominal_end = block_start + self.block_size;
        let range_start = off;
        let range_end = off + buf.len() as u64;

        let copy_start = range_start.max(block_start);
        let copy_end = range_end.min(block_nominal_end);
        if copy_start >= copy_end {
            return 0;
        }

        let buf_offset = (copy_start - range_start) as usize;
        let block_offset = (copy_start - block_start) as usize;
        let wanted = (copy_end - copy_start) as usize;

        let available = block.len().saturating_sub(block_offset);
        let copy_len = wanted.min(available);
        if copy_len == 0 {
            return 0;
        }

        buf[buf_offset..buf_offset + copy_len]
            .copy_from_slice(&block[block_offset..block_offset + copy_len]);
        copy_len
    }

    /// Single-block fetch: cache hit returns immediately; a miss locks the
    /// block's name and either fetches it (leader) or loops back to re-check
    /// the cache once the leader releases (follower).
    async fn get_block(&self, key: &str, block_id: u64) -> Result<Bytes, CacheError> {
        loop {
            if let Some(data) = self.store.get(key, block_id).await {
                return Ok(data);
            }

            let name = Self::lock_name(key, block_id);
            if self.single_flight.lock(&name).await {
                trace!(key, block_id, "acquired single-flight lock as leader");
                let mut buf = vec![0u8; self.block_size as usize];
                let offset = block_id * self.block_size;
                let result = self.upstream.read_at(key, &mut buf, offset).await;
                match result {
                    Ok(n) => {
                        buf.truncate(n);
                        let data = Bytes::from(buf);
                        self.store.add(key, block_id, data.clone()).await;
                        self.single_flight.unlock(&name).await;
                        return Ok(data);
                    }
                    Err(err) => {
                        warn!(key, block_id, error = %err, "upstream fetch failed");
                        self.single_flight.unlock(&name).await;
                        return Err(err);
                    }
                }
            } else {
                trace!(key, block_id, "followed single-flight lock, retrying cache lookup");
                continue;
            }
        }
    }

    /// Merged-policy fetch for one maximal run of consecutive missing block
    /// ids. Acquires every block's lock concurrently, issues exactly one
    /// upstream range read for the whole run, splits and inserts the response
    /// regardless of per-block leadership, then releases the locks this run
    /// actually acquired.
    async fn fetch_run(&self, key: &str, run_start: u64, run_end: u64) -> Result<(), CacheError> {
        let names: Vec<String> = (run_start..=run_end)
            .map(|b| Self::lock_name(key, b))
            .collect();
        let leader_flags = join_all(names.iter().map(|n| self.single_flight.lock(n))).await;

        let block_count = run_end - run_start + 1;
        let offset = run_start * self.block_size;
        let total_len = (block_count * self.block_size) as usize;
        debug!(
            key,
            run_start,
            run_end,
            offset,
            total_len,
            "issuing merged upstream range read"
        );

        let mut buf = vec![0u8; total_len];
        let result = self.upstream.read_at(key, &mut buf, offset).await;

        match &result {
            Ok(n) => {
                buf.truncate(*n);
                let data = Bytes::from(buf);
                for (i, block_id) in (run_start..=run_end).enumerate() {
                    let block_start = i * self.block_size as usize;
                    let block_end = (block_start + self.block_size as usize).min(data.len());
                    let slice = if block_start >= data.len() {
                        Bytes::new()
                    } else {
                        data.slice(block_start..block_end)
                    };
                    self.store.add(key, block_id, slice).await;
                }
            }
            Err(err) => {
                warn!(key, run_start, run_end, error = %err, "merged upstream range read failed");
            }
        }

        for (name, is_leader) in names.iter().zip(leader_flags.iter()) {
            if *is_leader {
                self.single_flight.unlock(name).await;
            }
        }

        result.map(|_| ())
    }

    /// Partition a sorted slice of block ids into maximal runs of consecutive values.
    fn partition_runs(ids: &[u64]) -> Vec<(u64, u64)> {
        let mut runs = Vec::new();
        let mut iter = ids.iter().copied();
        if let Some(first) = iter.next() {
            let mut start = first;
            let mut end = first;
            for id in iter {
                if id == end + 1 {
                    end = id;
                } else {
                    runs.push((start, end));
                    start = id;
                    end = id;
                }
            }
            runs.push((start, end));
        }
        runs
    }
}

#[async_trait::async_trait]
impl<R: RandomReader> MultiRangeReader for BlockCache<R> {
    async fn read_at(&self, key: &str, buf: &mut [u8], off: u64) -> Result<RangeOutcome, CacheError> {
        let mut bufs: Vec<&mut [u8]> = vec![buf];
        let outcome = self.read_at_multi(key, &mut bufs, &[off]).await?;
        Ok(RangeOutcome {
            bytes_written: outcome.bytes_written[0],
            end_of_object: outcome.end_of_object,
        })
    }

    async fn read_at_multi(
        &self,
        key: &str,
        bufs: &mut [&mut [u8]],
        offs: &[u64],
    ) -> Result<MultiRangeOutcome, CacheError> {
        if bufs.len() != offs.len() {
            return Err(CacheError::InvalidArgument(format!(
                "bufs.len() ({}) != offs.len() ({})",
                bufs.len(),
                offs.len()
            )));
        }
        if bufs.is_empty() {
            return Ok(MultiRangeOutcome {
                bytes_written: Vec::new(),
                end_of_object: false,
            });
        }

        let ranges: Vec<Option<(u64, u64)>> = bufs
            .iter()
            .zip(offs.iter())
            .map(|(buf, off)| self.touched_blocks(*off, buf.len()))
            .collect();

        let required: BTreeSet<u64> = ranges
            .iter()
            .flatten()
            .flat_map(|(start, end)| *start..=*end)
            .collect();

        let mut block_data: HashMap<u64, Bytes> = HashMap::new();
        let mut missing: Vec<u64> = Vec::new();
        for &block_id in &required {
            match self.store.get(key, block_id).await {
                Some(data) => {
                    block_data.insert(block_id, data);
                }
                None => missing.push(block_id),
            }
        }
        missing.sort_unstable();

        let mut first_error: Option<CacheError> = None;

        if self.split_ranges {
            let fetched = join_all(missing.iter().map(|&id| self.get_block(key, id))).await;
            for (id, result) in missing.iter().zip(fetched.into_iter()) {
                match result {
                    Ok(data) => {
                        block_data.insert(*id, data);
                    }
                    Err(err) => {
                        if first_error.is_none() {
                            first_error = Some(err);
                        }
                    }
                }
            }
        } else {
            let runs = Self::partition_runs(&missing);
            debug!(key, run_count = runs.len(), "merged miss handling: {} run(s)", runs.len());
            let results = join_all(runs.iter().map(|(s, e)| self.fetch_run(key, *s, *e))).await;
            for result in results {
                if let Err(err) = result {
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
            // Runs that succeeded inserted their blocks into the store; pick them up.
            for &block_id in &missing {
                if !block_data.contains_key(&block_id) {
                    if let Some(data) = self.store.get(key, block_id).await {
                        block_data.insert(block_id, data);
                    }
                }
            }
        }

        // Application pass: counts are accumulated in a single sequential pass
        // over already-resolved block data, once every concurrent fetch for
        // this call has completed, rather than under a mutex held across fetches.
        let mut bytes_written = vec![0usize; bufs.len()];
        for (i, ((buf, off), touched)) in bufs.iter_mut().zip(offs.iter()).zip(ranges.iter()).enumerate() {
            let Some((start, end)) = touched else {
                continue;
            };
            let mut written = 0usize;
            for block_id in *start..=*end {
                if let Some(data) = block_data.get(&block_id) {
                    written += self.apply_block(buf, *off, block_id, data);
                }
            }
            bytes_written[i] = written;
        }

        let end_of_object = bytes_written
            .iter()
            .zip(bufs.iter())
            .any(|(&n, buf)| n < buf.len());

        if let Some(err) = first_error {
            return Err(err);
        }

        Ok(MultiRangeOutcome {
            bytes_written,
            end_of_object,
        })
    }

    async fn purge(&self, key: &str) {
        self.store.purge_key(key).await;
    }

    async fn purge_all(&self) {
        self.store.purge_all().await;
    }
}
