//! The internal cuckoo table (spec §3, §4.2): a fixed-capacity, power-of-two
//! sized array of slots, with placement, bounded-walk displacement, lookup,
//! and removal. `B = 1` — each hash position addresses a single slot.

use std::hash::Hash;

use tracing::trace;

use crate::hash::{self, HashSeeds};
use crate::slot::Slot;

/// Outcome of [`InternalTable::insert`]. `Full` carries the entry that
/// could not be placed after the displacement budget was exhausted; it is
/// not present anywhere in the table (spec §4.2: "the table's state is
/// otherwise consistent").
pub(crate) enum InsertOutcome<K, V> {
    Inserted,
    Full { key: K, value: V },
}

pub(crate) struct InternalTable<K, V> {
    slots: Vec<Slot<K, V>>,
    mask: usize,
    count: usize,
    max_walk: usize,
    seeds: HashSeeds,
    rng: fastrand::Rng,
}

impl<K, V> InternalTable<K, V> {
    /// `capacity` must already be a power of two (the caller, `GenerationStack`,
    /// is responsible for that — spec §3: "`N` is a power of two").
    pub(crate) fn with_capacity(capacity: usize, max_walk: usize, seeds: HashSeeds) -> Self {
        debug_assert!(capacity.is_power_of_two());
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, Slot::empty);
        InternalTable {
            slots,
            mask: capacity - 1,
            count: 0,
            max_walk,
            seeds,
            rng: fastrand::Rng::new(),
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.mask + 1
    }

    pub(crate) fn len(&self) -> usize {
        self.count
    }

    fn positions(&self, key: &K, tag: u16) -> (usize, usize)
    where
        K: Hash,
    {
        let p1 = hash::h1(key, &self.seeds, self.mask + 1);
        let p2 = hash::alternate_position(p1, tag, self.mask + 1);
        (p1, p2)
    }

    /// Places `(key, value)` into this generation, displacing existing
    /// occupants along a bounded random walk if both candidate slots are
    /// occupied (spec §4.2). Never checks for an existing occurrence of
    /// `key` — that uniqueness decision belongs to the caller (the
    /// generation stack, for a unique-keyed map), since a multimap caller
    /// must be able to place a second occurrence at the key's other
    /// position.
    pub(crate) fn insert(&mut self, key: K, value: V) -> InsertOutcome<K, V>
    where
        K: Hash,
    {
        let tag = hash::fingerprint(&key, &self.seeds);
        let (p1, p2) = self.positions(&key, tag);

        if self.slots[p1].is_empty() {
            self.slots[p1].fill(tag, key, value);
            self.count += 1;
            return InsertOutcome::Inserted;
        }
        if self.slots[p2].is_empty() {
            self.slots[p2].fill(tag, key, value);
            self.count += 1;
            return InsertOutcome::Inserted;
        }

        // Both candidate slots are occupied: walk. Start at p1 or p2
        // per a per-insert coin flip (spec §4.2 design note: "no
        // randomness is required for correctness but a per-insert bit
        // flip is acceptable"); alternation between the two candidate
        // positions at each subsequent step avoids short cycles.
        let mut pos = if self.rng.bool() { p2 } else { p1 };
        let mut cur_tag = tag;
        let mut cur_key = key;
        let mut cur_value = value;

        for step in 0..self.max_walk {
            match self.slots[pos].replace(cur_tag, cur_key, cur_value) {
                None => {
                    // pos was empty: the entry now resting there is a net
                    // new insertion.
                    self.count += 1;
                    return InsertOutcome::Inserted;
                }
                Some((evicted_tag, evicted_key, evicted_value)) => {
                    trace!(step, pos, "cuckoo displacement");
                    let next_pos = hash::alternate_position(pos, evicted_tag, self.mask + 1);
                    cur_tag = evicted_tag;
                    cur_key = evicted_key;
                    cur_value = evicted_value;
                    pos = next_pos;
                }
            }
        }

        InsertOutcome::Full {
            key: cur_key,
            value: cur_value,
        }
    }

    /// Returns the value at whichever of `key`'s two positions holds it, if
    /// any.
    pub(crate) fn lookup(&self, key: &K) -> Option<&V>
    where
        K: Hash + PartialEq,
    {
        let tag = hash::fingerprint(key, &self.seeds);
        let p1 = hash::h1(key, &self.seeds, self.mask + 1);
        if self.slots[p1].matches(tag, key) {
            return self.slots[p1].value();
        }
        let p2 = hash::alternate_position(p1, tag, self.mask + 1);
        if self.slots[p2].matches(tag, key) {
            return self.slots[p2].value();
        }
        None
    }

    pub(crate) fn contains(&self, key: &K) -> bool
    where
        K: Hash + PartialEq,
    {
        self.lookup(key).is_some()
    }

    /// Collects every slot among `key`'s two positions that currently holds
    /// `key`, for the multimap (which may have the same key at both
    /// positions in a single generation).
    pub(crate) fn lookup_multi(&self, key: &K) -> Vec<&V>
    where
        K: Hash + PartialEq,
    {
        let tag = hash::fingerprint(key, &self.seeds);
        let p1 = hash::h1(key, &self.seeds, self.mask + 1);
        let p2 = hash::alternate_position(p1, tag, self.mask + 1);
        let mut out = Vec::with_capacity(2);
        if self.slots[p1].matches(tag, key) {
            out.push(self.slots[p1].value().expect("matched slot has a value"));
        }
        if p2 != p1 && self.slots[p2].matches(tag, key) {
            out.push(self.slots[p2].value().expect("matched slot has a value"));
        }
        out
    }

    /// Removes and returns a single matching entry, if any (spec §4.2:
    /// "find the matching slot (as in lookup) and mark it empty").
    pub(crate) fn remove(&mut self, key: &K) -> Option<(K, V)>
    where
        K: Hash + PartialEq,
    {
        let tag = hash::fingerprint(key, &self.seeds);
        let p1 = hash::h1(key, &self.seeds, self.mask + 1);
        if self.slots[p1].matches(tag, key) {
            self.count -= 1;
            return self.slots[p1].clear();
        }
        let p2 = hash::alternate_position(p1, tag, self.mask + 1);
        if self.slots[p2].matches(tag, key) {
            self.count -= 1;
            return self.slots[p2].clear();
        }
        None
    }
}
