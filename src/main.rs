//! `rangecache` — demonstration binary for the block-aligned, single-flight
//! cache: reads one range of one S3 object through the cache and reports
//! what happened.

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rangecache::{
    config::Config,
    io::{create_s3_client, BlockCache, BlockStore, KnownSize, MultiRangeReader, S3ObjectReader, SizeCache},
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("configuration error: {e}");
        return ExitCode::FAILURE;
    }

    info!(bucket = %config.s3_bucket, key = %config.key, "starting rangecache demo");

    let client = create_s3_client(config.s3_endpoint.as_deref(), &config.s3_region).await;
    let upstream = S3ObjectReader::new(client, config.s3_bucket.clone());

    let store = match BlockStore::new(config.cache_capacity) {
        Ok(store) => store,
        Err(e) => {
            error!("failed to construct block store: {e}");
            return ExitCode::FAILURE;
        }
    };
    let size_cache = match SizeCache::new(config.size_cache_capacity) {
        Ok(cache) => cache,
        Err(e) => {
            error!("failed to construct size cache: {e}");
            return ExitCode::FAILURE;
        }
    };

    let cache = BlockCache::new(upstream, config.block_size, store, config.split_ranges);

    info!(
        block_size = config.effective_block_size(),
        split_ranges = config.split_ranges,
        "cache configured"
    );

    if let Some(KnownSize::Absent) = size_cache.get(&config.key).await {
        error!(key = %config.key, "key known absent from a prior lookup, skipping read");
        return ExitCode::FAILURE;
    }

    let mut buf = vec![0u8; config.length];
    match cache.read_at(&config.key, &mut buf, config.offset).await {
        Ok(outcome) => {
            size_cache
                .set(&config.key, KnownSize::Size(config.offset + outcome.bytes_written as u64))
                .await;
            info!(
                bytes_written = outcome.bytes_written,
                end_of_object = outcome.end_of_object,
                "read complete"
            );
            println!(
                "read {} bytes at offset {} (end_of_object={})",
                outcome.bytes_written, config.offset, outcome.end_of_object
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            if matches!(e, rangecache::CacheError::NotFound(_)) {
                size_cache.set(&config.key, KnownSize::Absent).await;
            }
            error!("read failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "rangecache=debug"
    } else {
        "rangecache=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
