//! # NIMBUS Core Engine
//!
//! Entity Component System (ECS) state engine:
//! - Schema-described components stored per entity
//! - Reactive lifecycle effects tied to component presence
//! - Dense typed columns for hot numeric data
//!
//! ## Architecture Rules
//!
//! 1. **Structural changes go through the [`World`]** - membership bits and
//!    state entries never drift apart
//! 2. **Schemas are data** - defaulting, validation and (de)serialization are
//!    pure functions over a [`Schema`]
//! 3. **Teardown sees final values** - state is cleared only after a
//!    component's reactor cleanup has run
//!
//! ## Example
//!
//! ```rust,ignore
//! use nimbus_core::{ComponentDefinition, ComponentRegistry, Schema, World};
//!
//! let registry = ComponentRegistry::new();
//! let health = registry.register(
//!     ComponentDefinition::builder("HealthComponent")
//!         .json_id("health")
//!         .schema(Schema::object([("current", Schema::number())]))
//!         .build(),
//! )?;
//!
//! let mut world = World::new(registry);
//! let entity = world.spawn();
//! world.set_component(entity, &health, Some(json!({"current": 10.0})))?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]

pub mod ecs;
pub mod error;
pub mod scene;
pub mod schema;

pub use ecs::{
    BitSet, Component, ComponentDefinition, ComponentDefinitionBuilder, ComponentKind,
    ComponentRegistry, ComponentStorage, EntityId, LifecycleEvent, Position, ReactorCleanup,
    ReactorContext, ReactorFn, Rotation, Velocity, World,
};
pub use error::{EcsError, EcsResult};
pub use schema::{Schema, SchemaKind};

/// Re-exported so callers build component data without a direct dependency.
pub use serde_json::{json, Map, Value};
