//! # Entities
//!
//! An entity is an opaque key into the component tables. Slots are recycled,
//! so every key carries the generation of the slot it was issued for.

use std::fmt;

use super::bitset::BitSet;

/// Entity key: slot index in the low 32 bits, slot generation in the high
/// 32 bits. A key from a despawned slot never matches the slot's new owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// Packs a slot index and generation.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | index as u64)
    }

    /// Slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Slot generation at the time this key was issued.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// The unspecified entity.
    pub const NULL: Self = Self(u64::MAX);

    /// Whether this is [`EntityId::NULL`].
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u64::MAX
    }

    /// Packed 64-bit representation.
    #[inline]
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    /// Rebuilds an ID from [`EntityId::to_bits`].
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("null")
        } else {
            write!(f, "{}v{}", self.index(), self.generation())
        }
    }
}

/// Entity slot with its component membership set.
#[derive(Clone, Debug)]
pub(crate) struct EntityRecord {
    pub(crate) id: EntityId,
    /// Bit per registered component index.
    pub(crate) components: BitSet,
    pub(crate) alive: bool,
}

impl EntityRecord {
    #[inline]
    pub(crate) fn new(id: EntityId) -> Self {
        Self {
            id,
            components: BitSet::new(),
            alive: true,
        }
    }
}
