//! # ECS World
//!
//! The component store: entity slots, per-component state tables, reactor
//! roots, and dense typed columns.
//!
//! Membership bits and state entries move together. The only window where
//! they differ is inside [`World::remove_component`], where the bit is cleared
//! first so the reactor cleanup can still read the final state.

use std::any::TypeId;
use std::collections::{HashMap, VecDeque};

use serde_json::{Map, Value};

use super::component::Component;
use super::entity::{EntityId, EntityRecord};
use super::path;
use super::reactor::{LifecycleEvent, ReactorContext, ReactorRoot};
use super::registry::{ComponentKind, ComponentRegistry};
use super::storage::{ComponentStorage, DenseColumn};
use crate::error::{EcsError, EcsResult};

/// Per-component state and reactor roots, keyed by entity.
#[derive(Default)]
struct ComponentTable {
    state: HashMap<EntityId, Value>,
    reactors: HashMap<EntityId, ReactorRoot>,
}

/// The ECS World - container for all entity state.
///
/// # Example
///
/// ```rust,ignore
/// let mut world = World::new(registry);
///
/// let entity = world.spawn();
/// world.set_component(entity, &health, Some(json!({"current": 10.0})))?;
/// world.set_dense(entity, Position::new(1.0, 2.0, 3.0))?;
/// ```
pub struct World {
    /// All entity slots.
    entities: Vec<EntityRecord>,
    /// Free list of entity indices for reuse.
    free_indices: Vec<u32>,
    /// Number of currently alive entities.
    alive_count: usize,

    registry: ComponentRegistry,
    /// Registry epoch at construction; kinds from other epochs are rejected.
    epoch: u64,
    /// Indexed by [`ComponentKind::index`].
    tables: Vec<ComponentTable>,
    dense: HashMap<TypeId, Box<dyn DenseColumn>>,
    /// Deferred reactor re-runs, drained by [`World::flush_reactors`].
    pending_reactors: VecDeque<(EntityId, ComponentKind)>,
}

impl World {
    /// Creates an empty world bound to a component registry.
    #[must_use]
    pub fn new(registry: ComponentRegistry) -> Self {
        Self {
            entities: Vec::new(),
            free_indices: Vec::new(),
            alive_count: 0,
            epoch: registry.epoch(),
            registry,
            tables: Vec::new(),
            dense: HashMap::new(),
            pending_reactors: VecDeque::new(),
        }
    }

    /// The registry this world resolves components against.
    #[inline]
    #[must_use]
    pub const fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Returns the number of currently alive entities.
    #[inline]
    #[must_use]
    pub const fn alive_count(&self) -> usize {
        self.alive_count
    }

    // =========================================================================
    // Entity allocation
    // =========================================================================

    /// Spawns a new entity, reusing a freed slot when one exists.
    pub fn spawn(&mut self) -> EntityId {
        let id = if let Some(index) = self.free_indices.pop() {
            let record = &mut self.entities[index as usize];
            // Increment generation to invalidate old references
            let id = EntityId::new(index, record.id.generation().wrapping_add(1));
            *record = EntityRecord::new(id);
            id
        } else {
            let index = self.entities.len() as u32;
            let id = EntityId::new(index, 1);
            self.entities.push(EntityRecord::new(id));
            id
        };

        self.alive_count += 1;
        id
    }

    /// Despawns an entity: tears down every component, then frees the slot.
    ///
    /// Returns `false` if the entity was already dead or the ID was stale.
    pub fn despawn(&mut self, entity: EntityId) -> bool {
        if !self.is_alive(entity) {
            return false;
        }

        self.remove_all_components(entity);

        let idx = entity.index() as usize;
        for column in self.dense.values_mut() {
            column.remove_index(idx);
        }

        let record = &mut self.entities[idx];
        record.alive = false;
        record.components.clear();
        self.alive_count -= 1;
        self.free_indices.push(entity.index());
        true
    }

    /// Checks if an entity is alive.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.record(entity).is_some()
    }

    /// Iterates over all alive entities.
    pub fn iter_alive(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities
            .iter()
            .filter(|record| record.alive)
            .map(|record| record.id)
    }

    fn record(&self, entity: EntityId) -> Option<&EntityRecord> {
        if entity.is_null() {
            return None;
        }
        self.entities
            .get(entity.index() as usize)
            .filter(|record| record.alive && record.id == entity)
    }

    fn record_mut(&mut self, entity: EntityId) -> Option<&mut EntityRecord> {
        if entity.is_null() {
            return None;
        }
        self.entities
            .get_mut(entity.index() as usize)
            .filter(|record| record.alive && record.id == entity)
    }

    fn check_alive(&self, entity: EntityId) -> EcsResult<()> {
        if entity.is_null() {
            return Err(EcsError::UnspecifiedEntity);
        }
        if self.is_alive(entity) {
            Ok(())
        } else {
            Err(EcsError::EntityNotFound { entity })
        }
    }

    fn table_mut(&mut self, index: usize) -> &mut ComponentTable {
        if index >= self.tables.len() {
            self.tables.resize_with(index + 1, ComponentTable::default);
        }
        &mut self.tables[index]
    }

    #[inline]
    fn is_current(&self, kind: &ComponentKind) -> bool {
        kind.epoch() == self.epoch
    }

    fn check_kind(&self, kind: &ComponentKind) -> EcsResult<()> {
        if self.is_current(kind) {
            Ok(())
        } else {
            Err(EcsError::StaleComponent(kind.name().to_string()))
        }
    }

    fn not_found(entity: EntityId, kind: &ComponentKind) -> EcsError {
        EcsError::ComponentNotFound {
            entity,
            component: kind.name().to_string(),
        }
    }

    // =========================================================================
    // Schema components
    // =========================================================================

    /// Attaches or updates a component.
    ///
    /// On first attach the state is built by `on_init` or the schema default,
    /// and the reactor (if any) runs immediately. `on_set` always runs with
    /// `data`; later sets schedule a deferred reactor re-run.
    ///
    /// # Errors
    ///
    /// - [`EcsError::UnspecifiedEntity`] / [`EcsError::EntityNotFound`]
    /// - [`EcsError::StaleComponent`] for a kind from another registry epoch
    /// - Any error from `on_set`. A failed first attach leaves the entity
    ///   without the component.
    pub fn set_component(
        &mut self,
        entity: EntityId,
        kind: &ComponentKind,
        data: Option<Value>,
    ) -> EcsResult<&Value> {
        self.check_alive(entity)?;
        self.check_kind(kind)?;
        let index = kind.index();

        // Membership decides, not the state map: during removal the state
        // outlives the bit until the reactor cleanup has run.
        let first_attach = !self.has_component(entity, kind);
        if first_attach {
            let initial = kind.initial_value(entity);
            self.table_mut(index).state.insert(entity, initial);
            if let Some(record) = self.record_mut(entity) {
                record.components.insert(index);
            }
        }

        let result = match self.table_mut(index).state.get_mut(&entity) {
            Some(state) => kind.apply_set(entity, state, data.as_ref()),
            None => Err(Self::not_found(entity, kind)),
        };

        if let Err(error) = result {
            if first_attach {
                self.table_mut(index).state.remove(&entity);
                if let Some(record) = self.record_mut(entity) {
                    record.components.remove(index);
                }
            }
            return Err(error);
        }

        if first_attach {
            if kind.reactor().is_some() {
                self.table_mut(index)
                    .reactors
                    .insert(entity, ReactorRoot::default());
                self.run_reactor(entity, kind, LifecycleEvent::Attached);
            }
        } else {
            self.schedule_reactor(entity, kind);
        }

        self.tables
            .get(index)
            .and_then(|table| table.state.get(&entity))
            .ok_or_else(|| Self::not_found(entity, kind))
    }

    /// Reads a component's state, logging a warning when it is absent.
    pub fn get_component(&self, entity: EntityId, kind: &ComponentKind) -> Option<&Value> {
        let state = self.get_optional_component(entity, kind);
        if state.is_none() {
            tracing::warn!(%entity, component = kind.name(), "component not attached");
        }
        state
    }

    /// Reads a component's state.
    #[must_use]
    pub fn get_optional_component(&self, entity: EntityId, kind: &ComponentKind) -> Option<&Value> {
        if !self.is_current(kind) {
            return None;
        }
        self.tables
            .get(kind.index())
            .and_then(|table| table.state.get(&entity))
    }

    /// Whether the component is attached. Never errors.
    #[must_use]
    pub fn has_component(&self, entity: EntityId, kind: &ComponentKind) -> bool {
        self.is_current(kind)
            && self
                .record(entity)
                .is_some_and(|record| record.components.contains(kind.index()))
    }

    /// Detaches a component. No-op if it is not attached.
    ///
    /// Teardown order: `on_remove` with the live state, membership bit
    /// cleared, reactor cleanup (state still readable), state dropped.
    ///
    /// # Errors
    ///
    /// Returns the `on_remove` error. Teardown completes regardless.
    pub fn remove_component(&mut self, entity: EntityId, kind: &ComponentKind) -> EcsResult<()> {
        if !self.has_component(entity, kind) {
            return Ok(());
        }
        let index = kind.index();

        let hook_result = match self.get_optional_component(entity, kind) {
            Some(state) => kind.apply_remove(entity, state),
            None => Ok(()),
        };

        if let Some(record) = self.record_mut(entity) {
            record.components.remove(index);
        }

        if let Some(root) = self.table_mut(index).reactors.remove(&entity) {
            if let Some(cleanup) = root.cleanup {
                cleanup(self);
            }
        }

        // The cleanup may have re-attached the component.
        if !self.has_component(entity, kind) {
            self.table_mut(index).state.remove(&entity);
        }

        hook_result
    }

    /// Merges a partial update with dotted keys into the live state.
    ///
    /// Objects deep-merge; everything else is assigned. Single-value schemas
    /// and non-object input replace the whole state. Schedules one reactor
    /// re-run.
    ///
    /// # Errors
    ///
    /// [`EcsError::ComponentNotFound`] if the component is not attached.
    pub fn update_component(
        &mut self,
        entity: EntityId,
        kind: &ComponentKind,
        partial: Value,
    ) -> EcsResult<()> {
        self.check_alive(entity)?;
        self.check_kind(kind)?;
        if !self.has_component(entity, kind) {
            return Err(Self::not_found(entity, kind));
        }

        let Some(state) = self.table_mut(kind.index()).state.get_mut(&entity) else {
            return Err(Self::not_found(entity, kind));
        };

        match partial {
            Value::Object(entries) if !kind.is_single_value() => {
                for (key, value) in entries {
                    path::merge_path(state, &key, value);
                }
            }
            other => *state = other,
        }

        self.schedule_reactor(entity, kind);
        Ok(())
    }

    /// Mutates the live state in place and schedules a reactor re-run.
    ///
    /// # Errors
    ///
    /// [`EcsError::ComponentNotFound`] if the component is not attached.
    pub fn mutate_component<R>(
        &mut self,
        entity: EntityId,
        kind: &ComponentKind,
        mutate: impl FnOnce(&mut Value) -> R,
    ) -> EcsResult<R> {
        self.check_alive(entity)?;
        self.check_kind(kind)?;
        if !self.has_component(entity, kind) {
            return Err(Self::not_found(entity, kind));
        }
        let Some(state) = self.table_mut(kind.index()).state.get_mut(&entity) else {
            return Err(Self::not_found(entity, kind));
        };
        let result = mutate(state);
        self.schedule_reactor(entity, kind);
        Ok(result)
    }

    /// Components attached to an entity, in registry order.
    #[must_use]
    pub fn get_all_components(&self, entity: EntityId) -> Vec<ComponentKind> {
        let Some(record) = self.record(entity) else {
            return Vec::new();
        };
        record
            .components
            .iter()
            .filter_map(|index| self.registry.kind_at(index))
            .filter(|kind| self.is_current(kind))
            .collect()
    }

    /// State of every attached component, keyed by component name.
    #[must_use]
    pub fn get_all_component_data(&self, entity: EntityId) -> Map<String, Value> {
        self.get_all_components(entity)
            .into_iter()
            .filter_map(|kind| {
                self.get_optional_component(entity, &kind)
                    .map(|state| (kind.name().to_string(), state.clone()))
            })
            .collect()
    }

    /// Removes every component, logging and skipping individual failures.
    pub fn remove_all_components(&mut self, entity: EntityId) {
        for kind in self.get_all_components(entity) {
            if let Err(error) = self.remove_component(entity, &kind) {
                tracing::warn!(%entity, component = kind.name(), %error, "failed to remove component");
            }
        }
    }

    /// Persisted form of a component: `to_json` or the schema serializer.
    #[must_use]
    pub fn serialize_component(&self, entity: EntityId, kind: &ComponentKind) -> Option<Value> {
        self.get_optional_component(entity, kind)
            .and_then(|state| kind.serialize(entity, state))
    }

    /// Entities carrying every listed component.
    #[must_use]
    pub fn query(&self, kinds: &[&ComponentKind]) -> Vec<EntityId> {
        if !kinds.iter().all(|kind| self.is_current(kind)) {
            return Vec::new();
        }
        self.entities
            .iter()
            .filter(|record| record.alive)
            .filter(|record| kinds.iter().all(|kind| record.components.contains(kind.index())))
            .map(|record| record.id)
            .collect()
    }

    // =========================================================================
    // Reactors
    // =========================================================================

    fn schedule_reactor(&mut self, entity: EntityId, kind: &ComponentKind) {
        let Some(root) = self
            .tables
            .get_mut(kind.index())
            .and_then(|table| table.reactors.get_mut(&entity))
        else {
            return;
        };
        if root.running || root.scheduled {
            return;
        }
        root.scheduled = true;
        self.pending_reactors.push_back((entity, kind.clone()));
    }

    fn run_reactor(&mut self, entity: EntityId, kind: &ComponentKind, event: LifecycleEvent) {
        let Some(effect) = kind.reactor().cloned() else {
            return;
        };

        let previous = match self
            .tables
            .get_mut(kind.index())
            .and_then(|table| table.reactors.get_mut(&entity))
        {
            Some(root) => {
                root.running = true;
                root.scheduled = false;
                root.cleanup.take()
            }
            None => return,
        };

        if let Some(cleanup) = previous {
            cleanup(self);
        }

        let cleanup = if self.has_component(entity, kind) {
            effect(
                self,
                ReactorContext {
                    entity,
                    kind: kind.clone(),
                    event,
                },
            )
        } else {
            None
        };

        match self
            .tables
            .get_mut(kind.index())
            .and_then(|table| table.reactors.get_mut(&entity))
        {
            Some(root) => {
                root.running = false;
                root.cleanup = cleanup;
            }
            // Removed while running: tear down what it just set up.
            None => {
                if let Some(cleanup) = cleanup {
                    cleanup(self);
                }
            }
        }
    }

    /// Runs deferred reactor re-runs. Returns how many ran.
    pub fn flush_reactors(&mut self) -> usize {
        let mut ran = 0;
        while let Some((entity, kind)) = self.pending_reactors.pop_front() {
            let scheduled = self
                .tables
                .get(kind.index())
                .and_then(|table| table.reactors.get(&entity))
                .is_some_and(|root| root.scheduled);
            if scheduled {
                self.run_reactor(entity, &kind, LifecycleEvent::Updated);
                ran += 1;
            }
        }
        ran
    }

    /// Number of reactor re-runs waiting for [`World::flush_reactors`].
    #[must_use]
    pub fn pending_reactor_count(&self) -> usize {
        self.pending_reactors.len()
    }

    // =========================================================================
    // Dense columns
    // =========================================================================

    /// Read access to a whole column.
    #[must_use]
    pub fn storage<C: Component>(&self) -> Option<&ComponentStorage<C>> {
        self.dense
            .get(&TypeId::of::<C>())
            .and_then(|column| column.as_any().downcast_ref())
    }

    fn storage_mut<C: Component>(&mut self) -> Option<&mut ComponentStorage<C>> {
        self.dense
            .get_mut(&TypeId::of::<C>())
            .and_then(|column| column.as_any_mut().downcast_mut())
    }

    /// Writes a dense component. Returns the previous value.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnspecifiedEntity`] / [`EcsError::EntityNotFound`].
    pub fn set_dense<C: Component>(&mut self, entity: EntityId, component: C) -> EcsResult<Option<C>> {
        self.check_alive(entity)?;
        let column = self
            .dense
            .entry(TypeId::of::<C>())
            .or_insert_with(|| -> Box<dyn DenseColumn> { Box::new(ComponentStorage::<C>::default()) });
        column
            .as_any_mut()
            .downcast_mut::<ComponentStorage<C>>()
            .map(|storage| storage.set(entity.index() as usize, component))
            .ok_or_else(|| EcsError::UnknownComponent(C::NAME.to_string()))
    }

    /// Reads a dense component.
    #[must_use]
    pub fn dense<C: Component>(&self, entity: EntityId) -> Option<&C> {
        if !self.is_alive(entity) {
            return None;
        }
        self.storage::<C>()?.get(entity.index() as usize)
    }

    /// Mutable access to a dense component.
    pub fn dense_mut<C: Component>(&mut self, entity: EntityId) -> Option<&mut C> {
        if !self.is_alive(entity) {
            return None;
        }
        self.storage_mut::<C>()?.get_mut(entity.index() as usize)
    }

    /// Whether a dense component is present.
    #[must_use]
    pub fn has_dense<C: Component>(&self, entity: EntityId) -> bool {
        self.dense::<C>(entity).is_some()
    }

    /// Removes a dense component.
    pub fn remove_dense<C: Component>(&mut self, entity: EntityId) -> Option<C> {
        if !self.is_alive(entity) {
            return None;
        }
        self.storage_mut::<C>()?.remove(entity.index() as usize)
    }

    /// Alive entities carrying a dense component.
    #[must_use]
    pub fn query_dense<C: Component>(&self) -> Vec<EntityId> {
        let Some(storage) = self.storage::<C>() else {
            return Vec::new();
        };
        storage
            .iter()
            .filter_map(|(index, _)| self.entities.get(index))
            .filter(|record| record.alive)
            .map(|record| record.id)
            .collect()
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("alive_count", &self.alive_count)
            .field("components", &self.registry.len())
            .field("dense_columns", &self.dense.len())
            .field("pending_reactors", &self.pending_reactors.len())
            .finish()
    }
}
