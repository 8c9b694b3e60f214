//! Seeded hashing primitives: two independent position hashes `h1`/`h2` and
//! a non-zero fingerprint `fp`, plus the partial-key identity used to
//! recover an evicted entry's alternate position without re-hashing the key.

use std::hash::{Hash, Hasher};

use siphasher::sip::SipHasher13;

/// The multiplicative constant used to scramble a fingerprint into a
/// position-sized offset for the `p2` recovery identity. Arbitrary odd
/// 64-bit constant, chosen the same way the teacher table picks its own
/// `MUL` folding constant.
const SCRAMBLE: u64 = 0x2d35_8dcc_aa6c_78a5;

/// Seeds for the position hash and the fingerprint hash. `h2` is not
/// separately seeded — it is derived from `h1` and the fingerprint (see
/// [`h2`]) — but the two seeds here are still independently keyed so `h1`
/// and `fp` are statistically uncorrelated even though they hash the same
/// key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HashSeeds {
    pub seed1: u64,
    pub seed_fp: u64,
}

impl Default for HashSeeds {
    fn default() -> Self {
        // Fixed default constants, as spec.md §6 requires for the
        // `hash_seeds` config knob's default.
        HashSeeds {
            seed1: 0x9E37_79B9_7F4A_7C15,
            seed_fp: 0x1656_67B1_9E37_79F9,
        }
    }
}

fn hash_with(seed: u64, key: &impl Hash) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(seed, seed.rotate_left(32));
    key.hash(&mut hasher);
    hasher.finish()
}

/// First hash position, reduced mod `n` (`n` must be a power of two).
#[inline]
pub fn h1(key: &impl Hash, seeds: &HashSeeds, n: usize) -> usize {
    hash_with(seeds.seed1, key) as usize & (n - 1)
}

/// Second hash position: derived from `p1` and the key's fingerprint via
/// the standard partial-key cuckoo identity (spec §4.1), not an
/// independently re-hashed value. This is what makes [`alternate_position`]
/// invertible — an arbitrarily-seeded second hash would not generally
/// satisfy `p2 = p1 XOR (fp * C) mod N`.
#[inline]
pub fn h2(key: &impl Hash, seeds: &HashSeeds, n: usize) -> usize {
    let p1 = h1(key, seeds, n);
    let tag = fingerprint(key, seeds);
    alternate_position(p1, tag, n)
}

/// Derives the alternate bucket position from a known position and the
/// slot's fingerprint: `p2 = p1 XOR (fp * C) mod N`. This is symmetric:
/// applying it to `p2` recovers `p1`. `n` must be a power of two. This is
/// what lets displacement recover an evicted entry's other position from
/// the slot's tag alone, without re-hashing the (possibly expensive) key.
#[inline]
pub fn alternate_position(p: usize, tag: u16, n: usize) -> usize {
    let scrambled = (tag as u64).wrapping_mul(SCRAMBLE);
    (p ^ scrambled as usize) & (n - 1)
}

/// Shard selection: the top `shard_bits` bits of the same `seed1`-keyed
/// hash `h1` draws its low bits from. Disjoint bit ranges mean a shard's
/// own table can use the full `h1`/`h2` machinery on its slice of keys
/// without either layer perturbing the other's distribution.
#[inline]
pub(crate) fn shard_index(key: &impl Hash, seeds: &HashSeeds, shard_bits: u32) -> usize {
    if shard_bits == 0 {
        return 0;
    }
    (hash_with(seeds.seed1, key) >> (64 - shard_bits)) as usize
}

/// A 16-bit non-zero fingerprint derived from the key. Zero is reserved to
/// mean "empty slot", so a zero hash output is forced to 1.
#[inline]
pub fn fingerprint(key: &impl Hash, seeds: &HashSeeds) -> u16 {
    let h = hash_with(seeds.seed_fp, key);
    let tag = (h ^ (h >> 16)) as u16;
    if tag == 0 { 1 } else { tag }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_never_zero() {
        let seeds = HashSeeds::default();
        for k in 0u64..10_000 {
            assert_ne!(fingerprint(&k, &seeds), 0);
        }
    }

    #[test]
    fn alternate_position_is_involutive() {
        let n = 1024usize;
        for p in [0usize, 1, 512, 1023] {
            for tag in [1u16, 7, 255, 65535] {
                let p2 = alternate_position(p, tag, n);
                let p1_again = alternate_position(p2, tag, n);
                assert_eq!(p1_again, p);
            }
        }
    }

    #[test]
    fn shard_index_stays_within_range() {
        let seeds = HashSeeds::default();
        for bits in [0u32, 1, 4, 8] {
            for k in 0u64..500 {
                let idx = shard_index(&k, &seeds, bits);
                assert!(idx < (1usize << bits));
            }
        }
    }

    #[test]
    fn h1_and_h2_differ_for_most_keys() {
        let seeds = HashSeeds::default();
        let n = 4096;
        let mut same = 0;
        for k in 0u64..1000 {
            if h1(&k, &seeds, n) == h2(&k, &seeds, n) {
                same += 1;
            }
        }
        // Collisions between two independent hashes should be rare, not
        // systematic.
        assert!(same < 50, "h1/h2 collided {same}/1000 times");
    }

    proptest::proptest! {
        /// `alternate_position` must recover `p1` from `p2` for any
        /// position/tag/table-size triple, since `h2`'s definition and the
        /// whole displacement walk depend on that identity holding (spec
        /// §4.1).
        #[test]
        fn alternate_position_roundtrips_prop(p in 0usize..65536, tag in 1u16..=u16::MAX, bits in 4u32..20) {
            let n = 1usize << bits;
            let p = p & (n - 1);
            let p2 = alternate_position(p, tag, n);
            let p1_again = alternate_position(p2, tag, n);
            proptest::prop_assert_eq!(p1_again, p);
        }

        /// `h2` is always exactly the identity applied to `h1`, by
        /// construction, for any key.
        #[test]
        fn h2_matches_alternate_position_of_h1_prop(key in 0u64..u64::MAX, bits in 4u32..20) {
            let n = 1usize << bits;
            let seeds = HashSeeds::default();
            let p1 = h1(&key, &seeds, n);
            let tag = fingerprint(&key, &seeds);
            proptest::prop_assert_eq!(h2(&key, &seeds, n), alternate_position(p1, tag, n));
        }
    }
}
