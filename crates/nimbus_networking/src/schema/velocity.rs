//! Linear velocity schema.

use nimbus_core::Velocity;

use super::{merge_fields, NetworkSchema, ReadContext, WriteContext};
use crate::error::NetworkResult;

const LINEAR: u8 = 1 << 0;

/// Linear velocity as `f64` fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct VelocitySchema;

impl NetworkSchema for VelocitySchema {
    fn name(&self) -> &'static str {
        "velocity"
    }

    fn write(&self, ctx: &mut WriteContext<'_>) -> NetworkResult<bool> {
        let Some(v) = ctx.component::<Velocity>() else {
            return Ok(false);
        };
        let slot = ctx.begin_mask()?;
        let mask = if ctx.write_fields("linear_velocity", &[v.x, v.y, v.z])? {
            LINEAR
        } else {
            0
        };
        ctx.finish_mask(slot, mask)
    }

    fn read(&self, ctx: &mut ReadContext<'_, '_>) -> NetworkResult<()> {
        if ctx.read_mask(LINEAR)? & LINEAR != 0 {
            let incoming = ctx.read_fields::<3>()?;
            ctx.apply::<Velocity>(|v| {
                let [x, y, z] = merge_fields([v.x, v.y, v.z], incoming);
                *v = Velocity::new(x, y, z);
            })?;
        }
        Ok(())
    }
}
