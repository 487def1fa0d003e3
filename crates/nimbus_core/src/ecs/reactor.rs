//! # Lifecycle Effects
//!
//! A reactor is bound to one (entity, component) pair. It runs when the
//! component is attached, re-runs after updates, and hands back a cleanup
//! that runs before the next re-run and on removal.

use std::sync::Arc;

use super::entity::EntityId;
use super::registry::ComponentKind;
use super::world::World;

/// Why a reactor is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// First attachment of the component.
    Attached,
    /// A deferred re-run after the state changed.
    Updated,
}

/// Arguments passed to a reactor.
#[derive(Clone, Debug)]
pub struct ReactorContext {
    /// The entity the component is attached to.
    pub entity: EntityId,
    /// The component owning this reactor.
    pub kind: ComponentKind,
    /// Why the reactor is running.
    pub event: LifecycleEvent,
}

/// Teardown returned by a reactor run.
pub type ReactorCleanup = Box<dyn FnOnce(&mut World) + Send>;

/// A lifecycle effect.
pub type ReactorFn = Arc<dyn Fn(&mut World, ReactorContext) -> Option<ReactorCleanup> + Send + Sync>;

/// Per-(entity, component) reactor state.
#[derive(Default)]
pub(crate) struct ReactorRoot {
    pub(crate) cleanup: Option<ReactorCleanup>,
    pub(crate) running: bool,
    pub(crate) scheduled: bool,
}
