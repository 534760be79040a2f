//! Configuration for the `rangecache` demonstration binary.
//!
//! A `clap`-derived CLI with `BLOCKCACHE_`-prefixed environment fallbacks for
//! every flag. The core library has no configuration of its own beyond the
//! constructor parameters in [`crate::io::BlockCache`]; this module exists
//! purely to drive the demonstration binary.

use clap::Parser;

use crate::error::ConfigError;
use crate::io::DEFAULT_BLOCK_SIZE;

/// Default AWS region used when none is supplied.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default number of blocks the demonstration binary's cache can hold.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Default number of entries the demonstration binary's size cache can hold.
pub const DEFAULT_SIZE_CACHE_CAPACITY: usize = 1024;

/// `rangecache` — demonstrate the block-aligned, single-flight cache against
/// an S3-compatible bucket.
#[derive(Parser, Debug, Clone)]
#[command(name = "rangecache")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// S3 bucket containing the objects to read through the cache.
    #[arg(long, env = "BLOCKCACHE_S3_BUCKET")]
    pub s3_bucket: String,

    /// Custom S3 endpoint URL for S3-compatible services (MinIO, etc.).
    #[arg(long, env = "BLOCKCACHE_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// AWS region for S3.
    #[arg(long, default_value = DEFAULT_REGION, env = "BLOCKCACHE_S3_REGION")]
    pub s3_region: String,

    /// Object key to read through the cache.
    #[arg(long, env = "BLOCKCACHE_KEY")]
    pub key: String,

    /// Block size in bytes. `0` falls back to the 64 KiB default.
    #[arg(long, default_value_t = 0, env = "BLOCKCACHE_BLOCK_SIZE")]
    pub block_size: u64,

    /// Maximum number of blocks to cache.
    #[arg(long, default_value_t = DEFAULT_CACHE_CAPACITY, env = "BLOCKCACHE_CACHE_CAPACITY")]
    pub cache_capacity: usize,

    /// Maximum number of known-size/absent entries to cache.
    #[arg(long, default_value_t = DEFAULT_SIZE_CACHE_CAPACITY, env = "BLOCKCACHE_SIZE_CACHE_CAPACITY")]
    pub size_cache_capacity: usize,

    /// Issue one upstream request per missing block instead of merging
    /// adjacent misses into contiguous range requests.
    #[arg(long, default_value_t = false, env = "BLOCKCACHE_SPLIT_RANGES")]
    pub split_ranges: bool,

    /// Byte offset to read from.
    #[arg(long, default_value_t = 0, env = "BLOCKCACHE_OFFSET")]
    pub offset: u64,

    /// Number of bytes to read.
    #[arg(long, default_value_t = 4096, env = "BLOCKCACHE_LENGTH")]
    pub length: usize,

    /// Enable verbose (debug level) logging.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Config {
    /// Validate the configuration, returning a readable error otherwise.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.s3_bucket.is_empty() {
            return Err(ConfigError::Missing(
                "S3 bucket name is required. Set --s3-bucket or BLOCKCACHE_S3_BUCKET".to_string(),
            ));
        }
        if self.key.is_empty() {
            return Err(ConfigError::Missing(
                "object key is required. Set --key or BLOCKCACHE_KEY".to_string(),
            ));
        }
        if self.cache_capacity == 0 {
            return Err(ConfigError::Invalid(
                "cache_capacity must be greater than 0".to_string(),
            ));
        }
        if self.size_cache_capacity == 0 {
            return Err(ConfigError::Invalid(
                "size_cache_capacity must be greater than 0".to_string(),
            ));
        }
        if self.length == 0 {
            return Err(ConfigError::Invalid(
                "length must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// The effective block size, resolving the CLI's `0` sentinel to the
    /// crate-wide default (mirrors what [`crate::io::BlockCache::new`] does
    /// internally, so `rangecache --check` can report the real value before
    /// the cache is constructed).
    pub fn effective_block_size(&self) -> u64 {
        if self.block_size == 0 {
            DEFAULT_BLOCK_SIZE
        } else {
            self.block_size
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            s3_bucket: "test-bucket".to_string(),
            s3_endpoint: None,
            s3_region: "us-west-2".to_string(),
            key: "objects/sample.bin".to_string(),
            block_size: 0,
            cache_capacity: 64,
            size_cache_capacity: 128,
            split_ranges: false,
            offset: 0,
            length: 4096,
            verbose: false,
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn missing_bucket_is_rejected() {
        let mut config = test_config();
        config.s3_bucket = String::new();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn missing_key_is_rejected() {
        let mut config = test_config();
        config.key = String::new();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn zero_cache_capacity_is_rejected() {
        let mut config = test_config();
        config.cache_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_block_size_falls_back_to_default() {
        let mut config = test_config();
        config.block_size = 0;
        assert_eq!(config.effective_block_size(), DEFAULT_BLOCK_SIZE);
    }

    #[test]
    fn explicit_block_size_is_preserved() {
        let mut config = test_config();
        config.block_size = 128 * 1024;
        assert_eq!(config.effective_block_size(), 128 * 1024);
    }
}
