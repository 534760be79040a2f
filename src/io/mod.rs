//! I/O layer: the block-aligned, single-flight cache core plus its ambient
//! object-store adapter, size cache, and VSI-binding seam.

mod block_cache;
mod block_store;
mod random_reader;
mod s3_reader;
mod singleflight;
mod size_cache;
mod vsi;

pub use block_cache::{BlockCache, DEFAULT_BLOCK_SIZE};
pub use block_store::BlockStore;
pub use random_reader::{MultiRangeOutcome, MultiRangeReader, RandomReader, RangeOutcome};
pub use s3_reader::{create_s3_client, S3ObjectReader};
pub use singleflight::KeyedSingleFlight;
pub use size_cache::{KnownSize, SizeCache};
pub use vsi::VsiHandler;
