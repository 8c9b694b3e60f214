//! The growable map (spec §4.3): a stack of [`InternalTable`] generations of
//! geometrically increasing size, plus the public unique-keyed `Map`
//! container (spec §6) built directly on top of it.

use std::hash::Hash;

use tracing::debug;

use crate::config::TableConfig;
use crate::error::ConfigError;
use crate::hash::HashSeeds;
use crate::table::{InsertOutcome, InternalTable};

/// The shared generation-stack engine behind [`GrowableMap`] and
/// [`crate::multimap::MultiMap`]. Holds no opinion on key uniqueness — that
/// discipline belongs to the container built on top (spec §4.3 vs §4.4).
pub(crate) struct GenerationStack<K, V> {
    generations: Vec<InternalTable<K, V>>,
    config: TableConfig,
    seeds: HashSeeds,
}

impl<K, V> GenerationStack<K, V> {
    pub(crate) fn new(config: TableConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let seeds = config.resolved_hash_seeds();
        let capacity = config.resolved_capacity();
        let max_walk = config.resolved_max_walk(capacity);
        Ok(GenerationStack {
            generations: vec![InternalTable::with_capacity(capacity, max_walk, seeds)],
            config,
            seeds,
        })
    }

    fn push_generation(&mut self) {
        let new_capacity = self.generations.last().expect("at least one generation").capacity() * 2;
        let max_walk = self.config.resolved_max_walk(new_capacity);
        debug!(
            generation = self.generations.len(),
            new_capacity, "allocating new cuckoo table generation"
        );
        self.generations
            .push(InternalTable::with_capacity(new_capacity, max_walk, self.seeds));
    }

    /// Places `(key, value)` into the active (newest) generation, growing
    /// as many times as needed until the displacement chain's final
    /// occupant lands somewhere. Never checks for an existing key — see the
    /// module doc.
    pub(crate) fn insert_raw(&mut self, key: K, value: V)
    where
        K: Hash,
    {
        let mut key = key;
        let mut value = value;
        loop {
            let active = self.generations.last_mut().expect("at least one generation");
            match active.insert(key, value) {
                InsertOutcome::Inserted => return,
                InsertOutcome::Full {
                    key: k2,
                    value: v2,
                } => {
                    self.push_generation();
                    key = k2;
                    value = v2;
                }
            }
        }
    }

    /// Newest-to-oldest search, per spec §4.3 ("newer-first is typical").
    pub(crate) fn lookup_first(&self, key: &K) -> Option<&V>
    where
        K: Hash + PartialEq,
    {
        self.generations.iter().rev().find_map(|gen| gen.lookup(key))
    }

    pub(crate) fn contains(&self, key: &K) -> bool
    where
        K: Hash + PartialEq,
    {
        self.lookup_first(key).is_some()
    }

    /// All matches across every generation and both of `key`'s positions
    /// per generation (spec §4.4).
    pub(crate) fn lookup_all(&self, key: &K) -> Vec<&V>
    where
        K: Hash + PartialEq,
    {
        self.generations
            .iter()
            .rev()
            .flat_map(|gen| gen.lookup_multi(key))
            .collect()
    }

    pub(crate) fn remove_one(&mut self, key: &K) -> Option<(K, V)>
    where
        K: Hash + PartialEq,
    {
        self.generations.iter_mut().rev().find_map(|gen| gen.remove(key))
    }

    pub(crate) fn remove_all(&mut self, key: &K) -> usize
    where
        K: Hash + PartialEq,
    {
        let mut removed = 0;
        for gen in &mut self.generations {
            while gen.remove(key).is_some() {
                removed += 1;
            }
        }
        removed
    }

    pub(crate) fn len(&self) -> usize {
        self.generations.iter().map(InternalTable::len).sum()
    }

    pub(crate) fn generation_count(&self) -> usize {
        self.generations.len()
    }
}

/// A key-unique cuckoo map (spec §4.3, §6 "Map"). Values are overwritten
/// only via `remove` then `insert`; a duplicate `insert` is rejected
/// outright (spec §8 property 4).
pub struct GrowableMap<K, V> {
    core: GenerationStack<K, V>,
}

impl<K, V> GrowableMap<K, V>
where
    K: Hash + Eq,
{
    pub fn new(initial_capacity: usize) -> Result<Self, ConfigError> {
        Self::with_config(TableConfig::new(initial_capacity))
    }

    pub fn with_config(config: TableConfig) -> Result<Self, ConfigError> {
        Ok(GrowableMap {
            core: GenerationStack::new(config)?,
        })
    }

    /// Returns `false` without mutating if `key` is already present
    /// (uniqueness, spec §8 property 4); otherwise inserts and returns
    /// `true`.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        if self.core.lookup_first(&key).is_some() {
            return false;
        }
        self.core.insert_raw(key, value);
        true
    }

    pub fn lookup(&self, key: &K) -> Option<&V> {
        self.core.lookup_first(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.core.contains(key)
    }

    /// Removes `key`, returning whether it was present.
    pub fn remove(&mut self, key: &K) -> bool {
        self.core.remove_one(key).is_some()
    }

    pub fn size(&self) -> usize {
        self.core.len()
    }

    /// Number of internal table generations currently live. Exposed for
    /// tests exercising spec §8 scenario B ("internal generation count ≥
    /// 2"); not part of the external contract in spec §6.
    pub fn generation_count(&self) -> usize {
        self.core.generation_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_a_basic_insert_lookup_size() {
        let mut m: GrowableMap<u64, u64> = GrowableMap::new(16).unwrap();
        assert!(m.insert(1, 100));
        assert!(m.insert(2, 200));
        assert!(m.insert(3, 300));
        assert_eq!(m.lookup(&2), Some(&200));
        assert_eq!(m.lookup(&4), None);
        assert_eq!(m.size(), 3);
    }

    #[test]
    fn scenario_b_grows_past_initial_capacity() {
        let mut m: GrowableMap<u64, u64> = GrowableMap::new(16).unwrap();
        for k in 0u64..100 {
            assert!(m.insert(k, k * 10));
        }
        assert_eq!(m.size(), 100);
        for k in 0u64..100 {
            assert_eq!(m.lookup(&k), Some(&(k * 10)));
        }
        assert!(m.generation_count() >= 2);
    }

    #[test]
    fn scenario_f_insert_then_remove_all_in_reverse() {
        let mut m: GrowableMap<u64, u64> = GrowableMap::new(16).unwrap();
        for k in 0u64..10 {
            m.insert(k, k);
        }
        for k in (0u64..10).rev() {
            assert!(m.remove(&k));
        }
        assert_eq!(m.size(), 0);
        for k in 0u64..10 {
            assert_eq!(m.lookup(&k), None);
        }
    }

    #[test]
    fn uniqueness_rejects_duplicate_insert() {
        let mut m: GrowableMap<u64, u64> = GrowableMap::new(16).unwrap();
        assert!(m.insert(1, 100));
        assert!(!m.insert(1, 999));
        assert_eq!(m.lookup(&1), Some(&100));
        assert_eq!(m.size(), 1);
    }

    #[test]
    fn remove_then_miss_then_remove_again_fails() {
        let mut m: GrowableMap<u64, u64> = GrowableMap::new(16).unwrap();
        m.insert(7, 70);
        assert!(m.remove(&7));
        assert_eq!(m.lookup(&7), None);
        assert!(!m.remove(&7));
    }

    #[test]
    fn size_law_matches_inserts_minus_removes() {
        let mut m: GrowableMap<u64, u64> = GrowableMap::new(16).unwrap();
        let mut expected = 0usize;
        for k in 0u64..50 {
            if m.insert(k, k) {
                expected += 1;
            }
        }
        for k in 0u64..20 {
            if m.remove(&k) {
                expected -= 1;
            }
        }
        assert_eq!(m.size(), expected);
    }

    proptest::proptest! {
        /// `size()` always equals the number of distinct keys currently
        /// inserted, across an arbitrary interleaving of inserts and
        /// removes that may span several generations (spec §8 property 7).
        #[test]
        fn size_law_holds_for_arbitrary_op_sequences(
            ops in proptest::collection::vec((0u64..200, proptest::bool::ANY), 1..400)
        ) {
            let mut m: GrowableMap<u64, u64> = GrowableMap::new(16).unwrap();
            let mut model = std::collections::HashSet::new();
            for (k, do_insert) in ops {
                if do_insert {
                    if m.insert(k, k) {
                        model.insert(k);
                    }
                } else if m.remove(&k) {
                    model.remove(&k);
                }
            }
            proptest::prop_assert_eq!(m.size(), model.len());
            for k in &model {
                proptest::prop_assert_eq!(m.lookup(k), Some(k));
            }
        }
    }
}
