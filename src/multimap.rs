//! The multimap (spec §4.4): identical generation-stack shell to the map,
//! but `insert` never checks for an existing key and `lookup` returns every
//! matching value. A given key occupies at most two slots (one per hash
//! position) within a single generation; a third or later duplicate
//! naturally bounces between those same two positions until the
//! displacement budget is exhausted and cascades into a newer generation —
//! no special-casing needed beyond what [`GenerationStack`] already does.

use std::hash::Hash;

use crate::config::TableConfig;
use crate::error::ConfigError;
use crate::growable::GenerationStack;

pub struct MultiMap<K, V> {
    core: GenerationStack<K, V>,
}

impl<K, V> MultiMap<K, V>
where
    K: Hash + Eq,
{
    pub fn new(initial_capacity: usize) -> Result<Self, ConfigError> {
        Self::with_config(TableConfig::new(initial_capacity))
    }

    pub fn with_config(config: TableConfig) -> Result<Self, ConfigError> {
        Ok(MultiMap {
            core: GenerationStack::new(config)?,
        })
    }

    /// Always succeeds: no uniqueness check (spec §6 "MultiMap: insert
    /// always succeeds").
    pub fn insert(&mut self, key: K, value: V) {
        self.core.insert_raw(key, value);
    }

    /// Every value currently stored under `key`, as a multiset equal to the
    /// inserted multiset minus removed entries (spec §8 property 5).
    pub fn lookup(&self, key: &K) -> Vec<&V> {
        self.core.lookup_all(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.core.contains(key)
    }

    /// Removes one (implementation-chosen) matching entry.
    pub fn remove(&mut self, key: &K) -> bool {
        self.core.remove_one(key).is_some()
    }

    /// Removes every entry matching `key`, returning how many were removed.
    pub fn remove_all(&mut self, key: &K) -> usize {
        self.core.remove_all(key)
    }

    pub fn size(&self) -> usize {
        self.core.len()
    }
}
