//! Transform schemas: position and rotation as `f64` fields, or packed into
//! a `u64` and a `u32`.

use nimbus_core::{Position, Rotation};
use nimbus_shared::Vec3;

use super::{merge_fields, NetworkSchema, ReadContext, WriteContext};
use crate::authority::TrustRule;
use crate::codec::compression::{pack_quaternion, pack_vec3, unpack_quaternion, unpack_vec3};
use crate::error::NetworkResult;

const POSITION: u8 = 1 << 0;
const ROTATION: u8 = 1 << 1;

/// Position and rotation as full-precision floats, per-axis change masks.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransformSchema {
    trust: TrustRule,
}

impl TransformSchema {
    /// Schema accepting writes from the authority only.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            trust: TrustRule::AuthorityOnly,
        }
    }

    /// Overrides the trust rule.
    #[must_use]
    pub const fn with_trust(mut self, trust: TrustRule) -> Self {
        self.trust = trust;
        self
    }
}

impl NetworkSchema for TransformSchema {
    fn name(&self) -> &'static str {
        "transform"
    }

    fn trust(&self) -> TrustRule {
        self.trust
    }

    fn write(&self, ctx: &mut WriteContext<'_>) -> NetworkResult<bool> {
        let position = ctx.component::<Position>();
        let rotation = ctx.component::<Rotation>();
        if position.is_none() && rotation.is_none() {
            return Ok(false);
        }

        let slot = ctx.begin_mask()?;
        let mut mask = 0;
        if let Some(p) = position {
            if ctx.write_fields("position", &[p.x, p.y, p.z])? {
                mask |= POSITION;
            }
        }
        if let Some(r) = rotation {
            if ctx.write_fields("rotation", &[r.x, r.y, r.z, r.w])? {
                mask |= ROTATION;
            }
        }
        ctx.finish_mask(slot, mask)
    }

    fn read(&self, ctx: &mut ReadContext<'_, '_>) -> NetworkResult<()> {
        let mask = ctx.read_mask(POSITION | ROTATION)?;
        if mask & POSITION != 0 {
            let incoming = ctx.read_fields::<3>()?;
            ctx.apply::<Position>(|p| {
                let [x, y, z] = merge_fields([p.x, p.y, p.z], incoming);
                *p = Position::new(x, y, z);
            })?;
        }
        if mask & ROTATION != 0 {
            let incoming = ctx.read_fields::<4>()?;
            ctx.apply::<Rotation>(|r| {
                let [x, y, z, w] = merge_fields([r.x, r.y, r.z, r.w], incoming);
                *r = Rotation::new(x, y, z, w);
            })?;
        }
        Ok(())
    }
}

/// Position quantized into a `u64` and rotation into a `u32`.
///
/// Changes are detected on the packed values, so movement below one
/// quantization step is never sent.
#[derive(Debug, Clone, Copy)]
pub struct CompressedTransformSchema {
    position_range: f64,
    trust: TrustRule,
}

impl CompressedTransformSchema {
    /// Schema quantizing positions over `[-position_range, position_range]`.
    #[must_use]
    pub const fn new(position_range: f64) -> Self {
        Self {
            position_range,
            trust: TrustRule::AuthorityOnly,
        }
    }

    /// Overrides the trust rule.
    #[must_use]
    pub const fn with_trust(mut self, trust: TrustRule) -> Self {
        self.trust = trust;
        self
    }
}

impl NetworkSchema for CompressedTransformSchema {
    fn name(&self) -> &'static str {
        "compressed_transform"
    }

    fn trust(&self) -> TrustRule {
        self.trust
    }

    fn write(&self, ctx: &mut WriteContext<'_>) -> NetworkResult<bool> {
        let position = ctx.component::<Position>();
        let rotation = ctx.component::<Rotation>();
        if position.is_none() && rotation.is_none() {
            return Ok(false);
        }

        let slot = ctx.begin_mask()?;
        let mut mask = 0;
        if let Some(p) = position {
            let packed = pack_vec3(p.to_vec3(), self.position_range);
            if ctx.write_packed_u64("position", packed)? {
                mask |= POSITION;
            }
        }
        if let Some(r) = rotation {
            if ctx.write_packed_u32("rotation", pack_quaternion(r.to_quaternion()))? {
                mask |= ROTATION;
            }
        }
        ctx.finish_mask(slot, mask)
    }

    fn read(&self, ctx: &mut ReadContext<'_, '_>) -> NetworkResult<()> {
        let mask = ctx.read_mask(POSITION | ROTATION)?;
        if mask & POSITION != 0 {
            let Vec3 { x, y, z } = unpack_vec3(ctx.read_packed_u64()?, self.position_range);
            ctx.apply::<Position>(|p| *p = Position::new(x, y, z))?;
        }
        if mask & ROTATION != 0 {
            let rotation = Rotation::from_quaternion(unpack_quaternion(ctx.read_packed_u32()?));
            ctx.apply::<Rotation>(|r| *r = rotation)?;
        }
        Ok(())
    }
}
