//! # Bit Set
//!
//! Growable bitset, 64 indices per word. Used for component membership per
//! entity and for slot presence in dense columns.

/// Growable set of `usize` indices.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BitSet {
    /// 1 = present. 64 indices per u64.
    bits: Vec<u64>,
    /// Cached number of set bits.
    count: usize,
}

impl BitSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bits: Vec::new(),
            count: 0,
        }
    }

    /// Creates an empty set sized for `capacity` indices.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bits: vec![0u64; (capacity + 63) / 64],
            count: 0,
        }
    }

    /// Inserts an index. Returns `true` if it was not present.
    #[inline]
    pub fn insert(&mut self, index: usize) -> bool {
        let word = index / 64;
        if word >= self.bits.len() {
            self.bits.resize(word + 1, 0);
        }
        let mask = 1u64 << (index % 64);
        let was_clear = self.bits[word] & mask == 0;
        self.bits[word] |= mask;
        if was_clear {
            self.count += 1;
        }
        was_clear
    }

    /// Removes an index. Returns `true` if it was present.
    #[inline]
    pub fn remove(&mut self, index: usize) -> bool {
        let word = index / 64;
        let Some(slot) = self.bits.get_mut(word) else {
            return false;
        };
        let mask = 1u64 << (index % 64);
        let was_set = *slot & mask != 0;
        *slot &= !mask;
        if was_set {
            self.count -= 1;
        }
        was_set
    }

    /// Checks membership.
    #[inline]
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        let word = index / 64;
        (self.bits.get(word).copied().unwrap_or(0) >> (index % 64)) & 1 == 1
    }

    /// Number of set indices.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.count
    }

    /// Whether no index is set.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Clears all bits without releasing memory.
    pub fn clear(&mut self) {
        for word in &mut self.bits {
            *word = 0;
        }
        self.count = 0;
    }

    /// Iterates set indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, word)| **word != 0)
            .flat_map(|(word_idx, &word)| {
                let mut remaining = word;
                std::iter::from_fn(move || {
                    if remaining == 0 {
                        return None;
                    }
                    let bit = remaining.trailing_zeros() as usize;
                    remaining &= remaining - 1;
                    Some(word_idx * 64 + bit)
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_remove() {
        let mut set = BitSet::new();
        assert!(set.insert(3));
        assert!(!set.insert(3));
        assert!(set.insert(130));
        assert_eq!(set.len(), 2);
        assert!(set.contains(130));
        assert!(!set.contains(129));
        assert!(set.remove(3));
        assert!(!set.remove(3));
        assert!(!set.remove(10_000));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_iter_ascending() {
        let mut set = BitSet::with_capacity(256);
        for index in [200, 0, 63, 64, 65] {
            set.insert(index);
        }
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![0, 63, 64, 65, 200]);
        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.iter().count(), 0);
    }
}
