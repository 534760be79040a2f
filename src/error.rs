//! Error taxonomy for the cache core and its ambient CLI/config layer.

use thiserror::Error;

/// Errors surfaced by the upstream [`RandomReader`](crate::io::RandomReader) boundary
/// and by the cache components built on top of it.
///
/// End-of-object is deliberately *not* a variant here: a short read past the tail of
/// an object is data (`RangeOutcome::end_of_object` / `MultiRangeOutcome::end_of_object`),
/// never an `Err`. Only genuine failures reach this enum.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// The requested key does not exist upstream.
    #[error("key not found: {0}")]
    NotFound(String),

    /// Any other upstream failure (connection, decode, service error, ...).
    #[error("upstream error: {0}")]
    Upstream(String),

    /// A construction or call-site argument was invalid (zero capacity,
    /// mismatched `bufs`/`offs` lengths, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Errors raised while parsing or validating CLI/environment configuration.
///
/// Kept distinct from [`CacheError`] so that a configuration mistake never masquerades
/// as a cache-runtime failure.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// A required setting was not supplied on the command line or via environment.
    #[error("missing required setting: {0}")]
    Missing(String),

    /// A supplied setting failed validation.
    #[error("invalid setting: {0}")]
    Invalid(String),
}
