//! Sharded wrappers (spec §4.6): `2^s` independent generation stacks, each
//! behind its own lock, selected by the high bits of `h1(k)` — disjoint from
//! the low bits each shard's own tables use for intra-table positioning.
//! Grounded on `tuanla-mirabo-ccl`'s `DHashMap2` (a `[Mutex<Table<K, V>>; N]`
//! indexed by hash bits, one lock per partition) but built on this crate's
//! own generation-stack containers rather than a plain chained `Table`.

use std::hash::Hash;

use parking_lot::Mutex;

use crate::config::ShardConfig;
use crate::error::ConfigError;
use crate::growable::GrowableMap;
use crate::hash::{self, HashSeeds};
use crate::multimap::MultiMap;

/// A `GrowableMap` split across `2^s` independently-locked shards.
pub struct ShardedMap<K, V> {
    shards: Vec<Mutex<GrowableMap<K, V>>>,
    seeds: HashSeeds,
    shard_bits: u32,
}

impl<K, V> ShardedMap<K, V>
where
    K: Hash + Eq,
{
    pub fn new(initial_capacity: usize, shard_count: usize) -> Result<Self, ConfigError> {
        Self::with_config(ShardConfig::new(initial_capacity, shard_count))
    }

    pub fn with_config(config: ShardConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let seeds = config.table.resolved_hash_seeds();
        let shard_bits = config.shard_bits();
        let mut shards = Vec::with_capacity(config.shard_count);
        for _ in 0..config.shard_count {
            shards.push(Mutex::new(GrowableMap::with_config(config.table)?));
        }
        Ok(ShardedMap {
            shards,
            seeds,
            shard_bits,
        })
    }

    fn shard_of(&self, key: &K) -> &Mutex<GrowableMap<K, V>> {
        &self.shards[hash::shard_index(key, &self.seeds, self.shard_bits)]
    }

    pub fn insert(&self, key: K, value: V) -> bool {
        let idx = hash::shard_index(&key, &self.seeds, self.shard_bits);
        self.shards[idx].lock().insert(key, value)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.shard_of(key).lock().contains(key)
    }

    pub fn remove(&self, key: &K) -> bool {
        self.shard_of(key).lock().remove(key)
    }

    /// Sum of each shard's size taken under its own lock in turn. Not a
    /// consistent snapshot under concurrent writers, since no single lock
    /// is held across shards — there is no global size counter (spec
    /// §4.6).
    pub fn size(&self) -> usize {
        self.shards.iter().map(|s| s.lock().size()).sum()
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }
}

impl<K, V> ShardedMap<K, V>
where
    K: Hash + Eq,
    V: Clone,
{
    pub fn lookup(&self, key: &K) -> Option<V> {
        self.shard_of(key).lock().lookup(key).cloned()
    }
}

/// A `MultiMap` split across `2^s` independently-locked shards.
pub struct ShardedMultiMap<K, V> {
    shards: Vec<Mutex<MultiMap<K, V>>>,
    seeds: HashSeeds,
    shard_bits: u32,
}

impl<K, V> ShardedMultiMap<K, V>
where
    K: Hash + Eq,
{
    pub fn new(initial_capacity: usize, shard_count: usize) -> Result<Self, ConfigError> {
        Self::with_config(ShardConfig::new(initial_capacity, shard_count))
    }

    pub fn with_config(config: ShardConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let seeds = config.table.resolved_hash_seeds();
        let shard_bits = config.shard_bits();
        let mut shards = Vec::with_capacity(config.shard_count);
        for _ in 0..config.shard_count {
            shards.push(Mutex::new(MultiMap::with_config(config.table)?));
        }
        Ok(ShardedMultiMap {
            shards,
            seeds,
            shard_bits,
        })
    }

    fn shard_of(&self, key: &K) -> &Mutex<MultiMap<K, V>> {
        &self.shards[hash::shard_index(key, &self.seeds, self.shard_bits)]
    }

    pub fn insert(&self, key: K, value: V) {
        let idx = hash::shard_index(&key, &self.seeds, self.shard_bits);
        self.shards[idx].lock().insert(key, value);
    }

    pub fn contains(&self, key: &K) -> bool {
        self.shard_of(key).lock().contains(key)
    }

    pub fn remove(&self, key: &K) -> bool {
        self.shard_of(key).lock().remove(key)
    }

    pub fn remove_all(&self, key: &K) -> usize {
        self.shard_of(key).lock().remove_all(key)
    }

    pub fn size(&self) -> usize {
        self.shards.iter().map(|s| s.lock().size()).sum()
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }
}

impl<K, V> ShardedMultiMap<K, V>
where
    K: Hash + Eq,
    V: Clone,
{
    pub fn lookup(&self, key: &K) -> Vec<V> {
        self.shard_of(key).lock().lookup(key).into_iter().cloned().collect()
    }
}
