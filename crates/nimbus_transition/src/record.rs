//! # Transition Record
//!
//! One array-valued component per entity. Each element tracks a single
//! (component json id, property path) pair and its queue of in-flight events.

use nimbus_core::{ComponentDefinition, ComponentKind, ComponentRegistry, EcsResult, Schema, Value};
use serde::{Deserialize, Serialize};

use crate::error::{TransitionError, TransitionResult};

/// Json id of the Transition Record component.
pub const TRANSITION_JSON_ID: &str = "transition";

/// A queued target change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionEvent {
    /// Elapsed milliseconds.
    pub age: f64,
    /// Output captured when the event was queued.
    pub from_value: Value,
    /// Target value.
    pub to_value: Value,
    /// Length in milliseconds.
    pub duration: f64,
    /// Easing path.
    pub easing: String,
}

/// Transition state for one property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionEntry {
    /// Json id of the component owning the property.
    pub component_json_id: String,
    /// Dotted path inside that component's state.
    pub property_path: String,
    /// Transitionable type name.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Default duration for this entry.
    pub duration: f64,
    /// Default easing for this entry.
    pub easing: String,
    /// Resting value, captured on the first update.
    #[serde(default)]
    pub initial_value: Option<Value>,
    /// Last computed value.
    #[serde(default)]
    pub output: Option<Value>,
    /// Queued events, oldest first.
    #[serde(default)]
    pub events: Vec<TransitionEvent>,
}

impl TransitionEntry {
    /// Whether this entry tracks the given property.
    #[must_use]
    pub fn targets(&self, component_json_id: &str, property_path: &str) -> bool {
        self.component_json_id == component_json_id && self.property_path == property_path
    }
}

/// The Transition Record component definition.
#[must_use]
pub fn transition_definition() -> ComponentDefinition {
    ComponentDefinition::builder("TransitionComponent")
        .json_id(TRANSITION_JSON_ID)
        .schema(Schema::array(Schema::any()))
        .build()
}

/// Returns the registered record component, registering it if needed.
///
/// # Errors
///
/// Propagates registry failures.
pub fn register_transition_component(registry: &ComponentRegistry) -> EcsResult<ComponentKind> {
    match registry.lookup_by_json_id(TRANSITION_JSON_ID) {
        Some(kind) => Ok(kind),
        None => registry.register(transition_definition()),
    }
}

/// Decodes the record state.
///
/// # Errors
///
/// [`TransitionError::CorruptRecord`] when the state is not a list of entries.
pub fn decode_entries(state: &Value) -> TransitionResult<Vec<TransitionEntry>> {
    Vec::<TransitionEntry>::deserialize(state).map_err(|e| TransitionError::CorruptRecord(e.to_string()))
}

/// Encodes entries as record state.
///
/// # Errors
///
/// [`TransitionError::CorruptRecord`] if a value cannot be encoded.
pub fn encode_entries(entries: &[TransitionEntry]) -> TransitionResult<Value> {
    serde_json::to_value(entries).map_err(|e| TransitionError::CorruptRecord(e.to_string()))
}
