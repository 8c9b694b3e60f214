//! Layered cuckoo-hashing containers: a fixed-slot table with bounded-walk
//! displacement, a growable map and multimap built on a stack of such
//! tables, an approximate-membership filter built the same way but with
//! tag-only slots, and lock-sharded wrappers over the map and multimap for
//! concurrent use.
//!
//! See [`GrowableMap`], [`MultiMap`], [`CuckooFilter`], [`ShardedMap`], and
//! [`ShardedMultiMap`] for the public containers; [`TableConfig`] and
//! [`ShardConfig`] for construction-time tuning.

mod config;
mod error;
mod filter;
mod growable;
mod hash;
mod multimap;
mod shard;
mod slot;
mod table;

pub use config::{ShardConfig, TableConfig};
pub use error::ConfigError;
pub use filter::CuckooFilter;
pub use growable::GrowableMap;
pub use multimap::MultiMap;
pub use shard::{ShardedMap, ShardedMultiMap};
