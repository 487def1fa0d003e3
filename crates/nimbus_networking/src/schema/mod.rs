//! # Network Schemas
//!
//! A network schema is one writer/reader pair for one component group. The
//! registry order fixes the bit each schema owns in the entity change mask,
//! so every peer must register the same schemas in the same order.
//!
//! ## Writer contract
//!
//! 1. Reserve a change-mask byte
//! 2. Write only fields that changed since the last send (or all of them on a
//!    forced resync)
//! 3. Backfill the mask, or rewind to the reserved byte when nothing was
//!    written so unchanged data costs zero bytes
//!
//! Readers mirror this bit-for-bit and always consume what was written, even
//! when the values end up discarded.

mod transform;
mod velocity;

use std::sync::Arc;

use nimbus_core::{Component, EntityId, World};

use crate::authority::TrustRule;
use crate::codec::cursor::{ReadCursor, WriteCursor};
use crate::codec::state::SentStateCache;
use crate::config::ReplicationConfig;
use crate::error::{NetworkError, NetworkResult};

pub use transform::{CompressedTransformSchema, TransformSchema};
pub use velocity::VelocitySchema;

/// Bits in a change mask, and therefore the limit on schemas per registry
/// and sub-fields per schema.
pub const MAX_MASK_BITS: usize = 8;

/// One component group's wire encoding.
pub trait NetworkSchema: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Senders accepted besides the authority.
    fn trust(&self) -> TrustRule {
        TrustRule::AuthorityOnly
    }

    /// Writes the entity's changed fields. Returns whether anything was
    /// written; on `false` the cursor must be where it started.
    ///
    /// # Errors
    ///
    /// Cursor overruns.
    fn write(&self, ctx: &mut WriteContext<'_>) -> NetworkResult<bool>;

    /// Reads exactly what [`NetworkSchema::write`] produced, applying it only
    /// through [`ReadContext::apply`].
    ///
    /// # Errors
    ///
    /// Cursor overruns and malformed masks.
    fn read(&self, ctx: &mut ReadContext<'_, '_>) -> NetworkResult<()>;
}

/// A reserved change-mask byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct MaskSlot(usize);

/// Writer state for one entity within one packet.
pub struct WriteContext<'a> {
    pub(crate) cursor: &'a mut WriteCursor,
    pub(crate) world: &'a World,
    pub(crate) sent: &'a mut SentStateCache,
    pub(crate) entity: EntityId,
    pub(crate) force: bool,
}

#[allow(clippy::missing_errors_doc)]
impl WriteContext<'_> {
    /// The world being replicated.
    #[inline]
    #[must_use]
    pub fn world(&self) -> &World {
        self.world
    }

    /// The entity being written.
    #[inline]
    #[must_use]
    pub const fn entity(&self) -> EntityId {
        self.entity
    }

    /// Whether every field is written regardless of change.
    #[inline]
    #[must_use]
    pub const fn force(&self) -> bool {
        self.force
    }

    /// Reads a dense component of the entity being written.
    #[inline]
    #[must_use]
    pub fn component<C: Component>(&self) -> Option<C> {
        self.world.dense::<C>(self.entity).copied()
    }

    /// Reserves a change-mask byte.
    pub fn begin_mask(&mut self) -> NetworkResult<MaskSlot> {
        self.cursor.reserve_u8().map(MaskSlot)
    }

    /// Backfills `mask`, or rewinds to before the slot when it is zero.
    /// Returns whether anything was kept.
    pub fn finish_mask(&mut self, slot: MaskSlot, mask: u8) -> NetworkResult<bool> {
        if mask == 0 {
            self.cursor.rewind(slot.0);
            return Ok(false);
        }
        self.cursor.backfill_u8(slot.0, mask)?;
        Ok(true)
    }

    /// Writes `[fieldChangeMask][f64 per changed value]`.
    pub fn write_fields(&mut self, field: &'static str, values: &[f64]) -> NetworkResult<bool> {
        debug_assert!(values.len() <= MAX_MASK_BITS);
        let slot = self.begin_mask()?;
        let mut mask = 0u8;
        for (index, &value) in values.iter().enumerate() {
            let bits = value.to_bits();
            let index = index as u8;
            if self.force || self.sent.is_dirty(self.entity, field, index, bits) {
                self.cursor.write_f64(value)?;
                self.sent.stage(self.entity, field, index, bits);
                mask |= 1 << index;
            }
        }
        self.finish_mask(slot, mask)
    }

    /// Writes a packed `u64` when it changed.
    pub fn write_packed_u64(&mut self, field: &'static str, packed: u64) -> NetworkResult<bool> {
        if !self.force && !self.sent.is_dirty(self.entity, field, 0, packed) {
            return Ok(false);
        }
        self.cursor.write_u64(packed)?;
        self.sent.stage(self.entity, field, 0, packed);
        Ok(true)
    }

    /// Writes a packed `u32` when it changed.
    pub fn write_packed_u32(&mut self, field: &'static str, packed: u32) -> NetworkResult<bool> {
        if !self.force && !self.sent.is_dirty(self.entity, field, 0, u64::from(packed)) {
            return Ok(false);
        }
        self.cursor.write_u32(packed)?;
        self.sent.stage(self.entity, field, 0, u64::from(packed));
        Ok(true)
    }
}

/// Reader state for one entity within one packet.
///
/// `target` is `None` when the entity is unknown locally or the authority
/// check failed; reads still advance the cursor but [`ReadContext::apply`]
/// does nothing.
pub struct ReadContext<'a, 'b> {
    pub(crate) cursor: &'a mut ReadCursor<'b>,
    pub(crate) world: &'a mut World,
    pub(crate) target: Option<EntityId>,
}

#[allow(clippy::missing_errors_doc)]
impl ReadContext<'_, '_> {
    /// The entity values will be applied to, if any.
    #[inline]
    #[must_use]
    pub const fn target(&self) -> Option<EntityId> {
        self.target
    }

    /// Reads a change mask, rejecting bits outside `allowed`.
    pub fn read_mask(&mut self, allowed: u8) -> NetworkResult<u8> {
        let mask = self.cursor.read_u8()?;
        let unexpected = mask & !allowed;
        if unexpected != 0 {
            return Err(NetworkError::UnexpectedMaskBit(unexpected.trailing_zeros() as u8));
        }
        Ok(mask)
    }

    /// Mirror of [`WriteContext::write_fields`].
    pub fn read_fields<const N: usize>(&mut self) -> NetworkResult<[Option<f64>; N]> {
        let allowed = if N >= MAX_MASK_BITS { u8::MAX } else { (1u8 << N) - 1 };
        let mask = self.read_mask(allowed)?;
        let mut values = [None; N];
        for (index, value) in values.iter_mut().enumerate() {
            if mask & (1 << index) != 0 {
                *value = Some(self.cursor.read_f64()?);
            }
        }
        Ok(values)
    }

    /// Mirror of [`WriteContext::write_packed_u64`].
    pub fn read_packed_u64(&mut self) -> NetworkResult<u64> {
        self.cursor.read_u64()
    }

    /// Mirror of [`WriteContext::write_packed_u32`].
    pub fn read_packed_u32(&mut self) -> NetworkResult<u32> {
        self.cursor.read_u32()
    }

    /// Mutates the target's dense component, inserting the default first if
    /// it is missing. No-op without a target.
    pub fn apply<C: Component>(&mut self, update: impl FnOnce(&mut C)) -> NetworkResult<()> {
        let Some(entity) = self.target else {
            return Ok(());
        };
        let mut component = self.world.dense::<C>(entity).copied().unwrap_or_default();
        update(&mut component);
        self.world.set_dense(entity, component)?;
        Ok(())
    }
}

/// Overlays the values present in `incoming` onto `current`.
#[inline]
#[must_use]
pub fn merge_fields<const N: usize>(mut current: [f64; N], incoming: [Option<f64>; N]) -> [f64; N] {
    for (slot, value) in current.iter_mut().zip(incoming) {
        if let Some(value) = value {
            *slot = value;
        }
    }
    current
}

/// Ordered network schemas; a schema's index is its entity-mask bit.
#[derive(Clone, Default)]
pub struct NetworkSchemaRegistry {
    schemas: Vec<Arc<dyn NetworkSchema>>,
}

impl NetworkSchemaRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Transform (compressed or not, per config) followed by velocity.
    ///
    /// # Errors
    ///
    /// Invalid config.
    pub fn with_defaults(config: &ReplicationConfig) -> NetworkResult<Self> {
        config.validate()?;
        let mut registry = Self::new();
        if config.compress_transforms {
            registry.register(CompressedTransformSchema::new(config.position_range))?;
        } else {
            registry.register(TransformSchema::new())?;
        }
        registry.register(VelocitySchema)?;
        Ok(registry)
    }

    /// Appends a schema. Returns its mask bit.
    ///
    /// # Errors
    ///
    /// [`NetworkError::TooManySchemas`] past [`MAX_MASK_BITS`].
    pub fn register(&mut self, schema: impl NetworkSchema + 'static) -> NetworkResult<u8> {
        if self.schemas.len() >= MAX_MASK_BITS {
            return Err(NetworkError::TooManySchemas { limit: MAX_MASK_BITS });
        }
        let bit = self.schemas.len() as u8;
        tracing::trace!(schema = schema.name(), bit, "network schema registered");
        self.schemas.push(Arc::new(schema));
        Ok(bit)
    }

    /// Schema owning a mask bit.
    #[must_use]
    pub fn get(&self, bit: u8) -> Option<&dyn NetworkSchema> {
        self.schemas.get(usize::from(bit)).map(|schema| &**schema)
    }

    /// Schemas in mask-bit order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn NetworkSchema> + '_ {
        self.schemas.iter().map(|schema| &**schema)
    }

    /// Number of schemas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether no schemas are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl std::fmt::Debug for NetworkSchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter().map(|schema| schema.name())).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_config() {
        let plain = NetworkSchemaRegistry::with_defaults(&ReplicationConfig::default()).unwrap();
        assert_eq!(plain.iter().map(|schema| schema.name()).collect::<Vec<_>>(), ["transform", "velocity"]);

        let config = ReplicationConfig {
            compress_transforms: true,
            ..ReplicationConfig::default()
        };
        let compressed = NetworkSchemaRegistry::with_defaults(&config).unwrap();
        assert_eq!(compressed.get(0).unwrap().name(), "compressed_transform");
        assert!(compressed.get(2).is_none());
    }

    #[test]
    fn test_schema_limit() {
        let mut registry = NetworkSchemaRegistry::new();
        for expected in 0..8u8 {
            assert_eq!(registry.register(VelocitySchema).unwrap(), expected);
        }
        assert_eq!(
            registry.register(VelocitySchema),
            Err(NetworkError::TooManySchemas { limit: 8 })
        );
    }

    #[test]
    fn test_merge_fields() {
        assert_eq!(
            merge_fields([1.0, 2.0, 3.0], [None, Some(5.0), None]),
            [1.0, 5.0, 3.0]
        );
    }
}
