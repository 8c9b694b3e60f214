//! A single cuckoo table slot: a non-zero fingerprint tag plus the stored
//! key/value, or empty. `tag == 0` is reserved to mean "empty" (spec §3);
//! there is exactly one way to denote empty and it is cheap to test.

pub(crate) struct Slot<K, V> {
    tag: u16,
    entry: Option<(K, V)>,
}

impl<K, V> Slot<K, V> {
    pub(crate) const fn empty() -> Self {
        Slot {
            tag: 0,
            entry: None,
        }
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.tag == 0
    }

    #[inline]
    pub(crate) fn tag(&self) -> u16 {
        self.tag
    }

    pub(crate) fn fill(&mut self, tag: u16, key: K, value: V) {
        debug_assert_ne!(tag, 0, "tag 0 is reserved for the empty sentinel");
        self.tag = tag;
        self.entry = Some((key, value));
    }

    /// Replaces this slot's contents, returning the previous occupant (if
    /// any). Used both for in-place value updates and for the cuckoo walk's
    /// eviction step.
    pub(crate) fn replace(&mut self, tag: u16, key: K, value: V) -> Option<(u16, K, V)> {
        debug_assert_ne!(tag, 0);
        let prev_tag = self.tag;
        let prev = self.entry.replace((key, value)).map(|(k, v)| (prev_tag, k, v));
        self.tag = tag;
        prev
    }

    pub(crate) fn clear(&mut self) -> Option<(K, V)> {
        self.tag = 0;
        self.entry.take()
    }

    pub(crate) fn key_value(&self) -> Option<(&K, &V)> {
        self.entry.as_ref().map(|(k, v)| (k, v))
    }

    pub(crate) fn value(&self) -> Option<&V> {
        self.entry.as_ref().map(|(_, v)| v)
    }

    pub(crate) fn value_mut(&mut self) -> Option<&mut V> {
        self.entry.as_mut().map(|(_, v)| v)
    }

    pub(crate) fn key(&self) -> Option<&K> {
        self.entry.as_ref().map(|(k, _)| k)
    }

    /// Matches a slot whose tag equals `tag` and whose stored key equals
    /// `key`, per spec §4.2: tag comparison first (cheap), key equality
    /// only on tag match.
    pub(crate) fn matches<Q>(&self, tag: u16, key: &Q) -> bool
    where
        K: PartialEq<Q>,
    {
        self.tag == tag && self.entry.as_ref().is_some_and(|(k, _)| k == key)
    }
}

impl<K, V> Default for Slot<K, V> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<K: Clone, V: Clone> Clone for Slot<K, V> {
    fn clone(&self) -> Self {
        Slot {
            tag: self.tag,
            entry: self.entry.clone(),
        }
    }
}
