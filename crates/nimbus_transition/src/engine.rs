//! # Transition Engine
//!
//! Drives property transitions stored in Transition Records.
//!
//! ## Blending
//!
//! ```text
//! initial ──event A──▶ outA ──event B──▶ outB ──▶ property
//! ```
//!
//! Each event interpolates from the previous event's output, so a new target
//! picks up wherever the running transition currently is. Completed events
//! leave the queue and their target becomes the new resting value.

use nimbus_core::ecs::path;
use nimbus_core::{json, ComponentKind, ComponentRegistry, EntityId, Value, World};

use crate::config::TransitionConfig;
use crate::easing::Easing;
use crate::error::{TransitionError, TransitionResult};
use crate::record::{self, TransitionEntry, TransitionEvent};
use crate::transitionable::{write_back, TransitionableRegistry};

/// Arguments to [`TransitionEngine::set_target`].
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionTarget {
    /// Json id of the component owning the property.
    pub component_json_id: String,
    /// Dotted path to the property.
    pub property_path: String,
    /// Target value.
    pub value: Value,
    /// Milliseconds; falls back to the entry, then the config.
    pub duration: Option<f64>,
    /// Easing path; falls back to the entry, then the config.
    pub easing: Option<String>,
    /// Transitionable type name; detected from the value when absent.
    pub type_name: Option<String>,
}

impl TransitionTarget {
    /// Target with every option left to defaults.
    #[must_use]
    pub fn new(component_json_id: impl Into<String>, property_path: impl Into<String>, value: Value) -> Self {
        Self {
            component_json_id: component_json_id.into(),
            property_path: property_path.into(),
            value,
            duration: None,
            easing: None,
            type_name: None,
        }
    }

    /// Sets the duration in milliseconds.
    #[must_use]
    pub fn with_duration(mut self, duration_ms: f64) -> Self {
        self.duration = Some(duration_ms);
        self
    }

    /// Sets the easing path.
    #[must_use]
    pub fn with_easing(mut self, easing: impl Into<String>) -> Self {
        self.easing = Some(easing.into());
        self
    }

    /// Forces a transitionable type.
    #[must_use]
    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }
}

/// Owns the transitionable catalog and the record component handle.
pub struct TransitionEngine {
    kind: ComponentKind,
    types: TransitionableRegistry,
    config: TransitionConfig,
}

impl TransitionEngine {
    /// Registers the Transition Record component (once) and validates config.
    ///
    /// # Errors
    ///
    /// Invalid config or a registry failure.
    pub fn new(registry: &ComponentRegistry, config: TransitionConfig) -> TransitionResult<Self> {
        config.validate()?;
        let kind = record::register_transition_component(registry)?;
        Ok(Self {
            kind,
            types: TransitionableRegistry::with_defaults(),
            config,
        })
    }

    /// The Transition Record component.
    #[must_use]
    pub const fn kind(&self) -> &ComponentKind {
        &self.kind
    }

    /// The transitionable catalog, for registering custom types.
    pub fn types_mut(&mut self) -> &mut TransitionableRegistry {
        &mut self.types
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &TransitionConfig {
        &self.config
    }

    /// Decoded entries on an entity; empty when it has no record.
    ///
    /// # Errors
    ///
    /// [`TransitionError::CorruptRecord`].
    pub fn entries(&self, world: &World, entity: EntityId) -> TransitionResult<Vec<TransitionEntry>> {
        match world.get_optional_component(entity, &self.kind) {
            Some(state) => record::decode_entries(state),
            None => Ok(Vec::new()),
        }
    }

    fn store_entries(&self, world: &mut World, entity: EntityId, entries: &[TransitionEntry]) -> TransitionResult<()> {
        let encoded = record::encode_entries(entries)?;
        world.mutate_component(entity, &self.kind, move |state| *state = encoded)?;
        Ok(())
    }

    /// Starts a transition of a component property toward `target.value`.
    ///
    /// # Errors
    ///
    /// - [`TransitionError::UnresolvedType`], [`TransitionError::UnknownTransitionableType`],
    ///   [`TransitionError::TypeMismatch`] from type resolution
    /// - [`TransitionError::UnknownEasing`] for a bad easing path
    /// - [`TransitionError::Ecs`] when the entity does not exist
    pub fn set_target(&self, world: &mut World, entity: EntityId, target: TransitionTarget) -> TransitionResult<()> {
        let type_name = self
            .types
            .resolve(&target.value, target.type_name.as_deref())?
            .name();
        if let Some(easing) = &target.easing {
            Easing::parse(easing)?;
        }

        if !world.has_component(entity, &self.kind) {
            world.set_component(entity, &self.kind, Some(json!([])))?;
        }

        let mut entries = self.entries(world, entity)?;
        let index = match entries
            .iter()
            .position(|entry| entry.targets(&target.component_json_id, &target.property_path))
        {
            Some(index) => index,
            None => {
                entries.push(TransitionEntry {
                    component_json_id: target.component_json_id.clone(),
                    property_path: target.property_path.clone(),
                    type_name: type_name.to_string(),
                    duration: target.duration.unwrap_or(self.config.default_duration_ms),
                    easing: target
                        .easing
                        .clone()
                        .unwrap_or_else(|| self.config.default_easing.clone()),
                    initial_value: None,
                    output: None,
                    events: Vec::new(),
                });
                entries.len() - 1
            }
        };

        let entry = &mut entries[index];
        self.update_transition(world, entity, entry, 0.0, false)?;

        let from_value = entry
            .output
            .clone()
            .or_else(|| entry.initial_value.clone())
            .unwrap_or(Value::Null);
        let event = TransitionEvent {
            age: 0.0,
            from_value,
            to_value: target.value,
            duration: target.duration.unwrap_or(entry.duration),
            easing: target.easing.unwrap_or_else(|| entry.easing.clone()),
        };
        tracing::trace!(
            %entity,
            component = entry.component_json_id.as_str(),
            property = entry.property_path.as_str(),
            duration = event.duration,
            "transition queued"
        );
        entry.events.push(event);

        self.store_entries(world, entity, &entries)
    }

    /// Advances one entry by `delta_ms` and optionally writes the result.
    ///
    /// A missing component or property makes this a no-op.
    ///
    /// # Errors
    ///
    /// Unknown type or easing names in the entry, or a store failure.
    pub fn update_transition(
        &self,
        world: &mut World,
        entity: EntityId,
        entry: &mut TransitionEntry,
        delta_ms: f64,
        apply: bool,
    ) -> TransitionResult<()> {
        let Some(kind) = world.registry().lookup_by_json_id(&entry.component_json_id) else {
            tracing::trace!(component = entry.component_json_id.as_str(), "transition target not registered");
            return Ok(());
        };
        let Some(current) = world
            .get_optional_component(entity, &kind)
            .and_then(|state| path::get_path(state, &entry.property_path))
            .cloned()
        else {
            return Ok(());
        };

        let transitionable = self
            .types
            .get(&entry.type_name)
            .ok_or_else(|| TransitionError::UnknownTransitionableType(entry.type_name.clone()))?;

        // The baseline is captured once; afterwards only evictions move it.
        let mut output = entry.initial_value.get_or_insert(current).clone();

        // Steady state collapses to the resting value without writing back.
        if entry.events.is_empty() {
            entry.output = Some(output);
            return Ok(());
        }

        for event in &mut entry.events {
            event.age += delta_ms;
            output = if event.duration <= 0.0 || event.age >= event.duration {
                event.to_value.clone()
            } else {
                let easing = Easing::parse(&event.easing)?;
                let eased = easing.apply(event.age / event.duration);
                transitionable.interpolate(&output, &event.to_value, eased)
            };
        }

        let mut resting = None;
        entry.events.retain(|event| {
            let done = event.age >= event.duration;
            if done {
                resting = Some(event.to_value.clone());
            }
            !done
        });
        if resting.is_some() {
            entry.initial_value = resting;
        }
        entry.output = Some(output.clone());

        if apply {
            let property_path = entry.property_path.as_str();
            world.mutate_component(entity, &kind, |state| {
                if let Some(target) = path::get_path_mut(state, property_path) {
                    write_back(target, &output);
                }
            })?;
        }
        Ok(())
    }

    /// Advances every entry on one entity and stores the record.
    ///
    /// # Errors
    ///
    /// See [`TransitionEngine::update_transition`].
    pub fn update_entity(&self, world: &mut World, entity: EntityId, delta_ms: f64) -> TransitionResult<()> {
        let mut entries = self.entries(world, entity)?;
        if entries.is_empty() {
            return Ok(());
        }
        for entry in &mut entries {
            self.update_transition(world, entity, entry, delta_ms, true)?;
        }
        self.store_entries(world, entity, &entries)
    }

    /// Current output of one property's transition, if tracked.
    ///
    /// # Errors
    ///
    /// [`TransitionError::CorruptRecord`].
    pub fn output(
        &self,
        world: &World,
        entity: EntityId,
        component_json_id: &str,
        property_path: &str,
    ) -> TransitionResult<Option<Value>> {
        Ok(self
            .entries(world, entity)?
            .into_iter()
            .find(|entry| entry.targets(component_json_id, property_path))
            .and_then(|entry| entry.output))
    }
}
