//! The one fatal error kind this crate's core produces: an invalid
//! construction-time configuration (spec §7). Everything else — duplicate
//! inserts, misses, absent removes — is a `bool`/`Option` return, never an
//! `Err`.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("initial_capacity must be non-zero")]
    ZeroCapacity,
    #[error("shard_count must be non-zero")]
    ZeroShardCount,
    #[error("shard_count ({0}) must be a power of two")]
    ShardCountNotPowerOfTwo(usize),
}
