//! # Transition System
//!
//! Per-tick driver: advances every Transition Record in the world, then
//! drains the reactor re-runs the property writes scheduled.

use nimbus_core::World;

use crate::engine::TransitionEngine;

/// Runs the [`TransitionEngine`] once per simulated tick.
pub struct TransitionSystem {
    engine: TransitionEngine,
}

impl TransitionSystem {
    /// Wraps an engine.
    #[must_use]
    pub const fn new(engine: TransitionEngine) -> Self {
        Self { engine }
    }

    /// The wrapped engine, for `set_target` calls.
    #[must_use]
    pub const fn engine(&self) -> &TransitionEngine {
        &self.engine
    }

    /// Advances all transitions by `delta_ms`. Returns the number of entities
    /// updated.
    ///
    /// An entity whose record fails to update is logged and skipped; the
    /// rest of the tick still runs and reactors are always flushed.
    pub fn execute(&self, world: &mut World, delta_ms: f64) -> usize {
        let entities = world.query(&[self.engine.kind()]);
        let mut updated = 0;
        for entity in entities {
            match self.engine.update_entity(world, entity, delta_ms) {
                Ok(()) => updated += 1,
                Err(error) => tracing::warn!(%entity, %error, "transition update failed"),
            }
        }
        world.flush_reactors();
        updated
    }
}
