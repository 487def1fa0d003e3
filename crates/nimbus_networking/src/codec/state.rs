//! # Sent State
//!
//! Last value sent per (entity, field, slot), used by writers to skip
//! unchanged data. Values are compared as raw bits: `f64` fields store
//! `to_bits()`, compressed fields store the packed integer.
//!
//! Writes are staged while a packet is encoded and only committed once the
//! whole packet succeeded, so a failed encode never marks data as sent.

use std::collections::HashMap;

use nimbus_core::EntityId;

type FieldKey = (EntityId, &'static str, u8);

/// Per-field record of what was last put on the wire.
#[derive(Debug, Default)]
pub struct SentStateCache {
    sent: HashMap<FieldKey, u64>,
    staged: Vec<(FieldKey, u64)>,
}

impl SentStateCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `bits` differs from the last committed value.
    #[inline]
    #[must_use]
    pub fn is_dirty(&self, entity: EntityId, field: &'static str, slot: u8, bits: u64) -> bool {
        self.sent.get(&(entity, field, slot)) != Some(&bits)
    }

    /// Records a value written into the packet under construction.
    #[inline]
    pub fn stage(&mut self, entity: EntityId, field: &'static str, slot: u8, bits: u64) {
        self.staged.push(((entity, field, slot), bits));
    }

    /// Marks every staged value as sent.
    pub fn commit(&mut self) {
        self.sent.extend(self.staged.drain(..));
    }

    /// Drops staged values.
    pub fn discard(&mut self) {
        self.staged.clear();
    }

    /// Forgets an entity, so its next write sends every field.
    pub fn forget(&mut self, entity: EntityId) {
        self.sent.retain(|(owner, _, _), _| *owner != entity);
    }

    /// Forgets every entity `keep` rejects.
    pub fn retain_entities(&mut self, mut keep: impl FnMut(EntityId) -> bool) {
        self.sent.retain(|(owner, _, _), _| keep(*owner));
    }

    /// Forgets everything.
    pub fn clear(&mut self) {
        self.sent.clear();
        self.staged.clear();
    }

    /// Number of committed field slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sent.len()
    }

    /// Whether nothing has been committed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sent.is_empty()
    }
}
