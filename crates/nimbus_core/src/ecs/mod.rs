//! # Entity Component System
//!
//! Schema-described component state plus dense typed columns.
//!
//! ## Design Philosophy
//!
//! - Entity IDs are simple indices with generation counters
//! - Generic components hold JSON state described by a [`Schema`](crate::Schema)
//! - Hot numeric data (transforms, network records) lives in dense columns
//! - Lifecycle effects are explicit reactors owned by the world

mod bitset;
mod component;
mod definition;
mod entity;
pub mod path;
mod reactor;
mod registry;
mod storage;
mod world;

pub use bitset::BitSet;
pub use component::{Component, Position, Rotation, Velocity};
pub use definition::{
    ComponentDefinition, ComponentDefinitionBuilder, OnInitFn, OnRemoveFn, OnSetFn, ToJsonFn,
};
pub use entity::EntityId;
pub use reactor::{LifecycleEvent, ReactorCleanup, ReactorContext, ReactorFn};
pub use registry::{ComponentKind, ComponentRegistry};
pub use storage::ComponentStorage;
pub use world::World;
