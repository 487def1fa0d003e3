//! # Component Definitions
//!
//! A definition names a component, optionally gives it a stable json id and
//! a [`Schema`], and carries the lifecycle hooks the [`World`] invokes.
//! Hooks that are not supplied fall back to schema-driven behavior.
//!
//! [`World`]: super::World

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::entity::EntityId;
use super::reactor::{ReactorCleanup, ReactorContext, ReactorFn};
use super::world::World;
use crate::error::{EcsError, EcsResult};
use crate::schema::{self, Schema};

/// Builds the initial state on first attach.
pub type OnInitFn = Arc<dyn Fn(EntityId) -> Value + Send + Sync>;

/// Applies incoming data to live state: `(entity, state, data)`.
pub type OnSetFn = Arc<dyn Fn(EntityId, &mut Value, Option<&Value>) -> EcsResult<()> + Send + Sync>;

/// Observes the final state before removal.
pub type OnRemoveFn = Arc<dyn Fn(EntityId, &Value) -> EcsResult<()> + Send + Sync>;

/// Produces the persisted form of the state.
pub type ToJsonFn = Arc<dyn Fn(EntityId, &Value) -> Option<Value> + Send + Sync>;

/// A registered component descriptor.
pub struct ComponentDefinition {
    name: String,
    json_id: Option<String>,
    schema: Option<Schema>,
    on_init: Option<OnInitFn>,
    on_set: Option<OnSetFn>,
    on_remove: Option<OnRemoveFn>,
    to_json: Option<ToJsonFn>,
    reactor: Option<ReactorFn>,
}

impl ComponentDefinition {
    /// Starts a builder for a component called `name`.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> ComponentDefinitionBuilder {
        ComponentDefinitionBuilder {
            definition: Self {
                name: name.into(),
                json_id: None,
                schema: None,
                on_init: None,
                on_set: None,
                on_remove: None,
                to_json: None,
                reactor: None,
            },
        }
    }

    /// Registry key.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stable wire identifier.
    #[must_use]
    pub fn json_id(&self) -> Option<&str> {
        self.json_id.as_deref()
    }

    /// Shape of the state, if declared.
    #[must_use]
    pub const fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    /// Lifecycle effect, if any.
    #[must_use]
    pub const fn reactor(&self) -> Option<&ReactorFn> {
        self.reactor.as_ref()
    }

    /// Whether a set replaces the state instead of merging into it.
    #[must_use]
    pub fn is_single_value(&self) -> bool {
        self.schema.as_ref().map_or(true, schema::is_single_value)
    }

    /// Initial state: `on_init`, else the schema default, else `null`.
    #[must_use]
    pub fn initial_value(&self, entity: EntityId) -> Value {
        if let Some(on_init) = &self.on_init {
            return on_init(entity);
        }
        self.schema
            .as_ref()
            .and_then(schema::create_default)
            .unwrap_or(Value::Null)
    }

    /// Runs `on_set`, or the schema-driven default.
    ///
    /// The default checks required keys, then validators, then deserializes
    /// and either replaces or merges into `state`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::MissingRequiredValue`] or [`EcsError::InvalidValue`]
    /// from the schema checks, or whatever a custom hook returns.
    pub fn apply_set(&self, entity: EntityId, state: &mut Value, data: Option<&Value>) -> EcsResult<()> {
        if let Some(on_set) = &self.on_set {
            return on_set(entity, state, data);
        }

        let Some(data) = data else {
            return Ok(());
        };

        let Some(schema) = &self.schema else {
            *state = data.clone();
            return Ok(());
        };

        schema::check_required(schema, Some(data))
            .map_err(|key| EcsError::MissingRequiredValue { key })?;
        schema::check_validators(schema, Some(data), Some(state), entity)
            .map_err(|key| EcsError::InvalidValue { key })?;

        let Some(value) = schema::deserialize(schema, Some(state), Some(data)) else {
            return Ok(());
        };

        let merge = !schema::is_single_value(schema) && state.is_object() && value.is_object();
        if !merge {
            *state = value;
        } else if let (Some(target), Value::Object(source)) = (state.as_object_mut(), value) {
            target.extend(source);
        }
        Ok(())
    }

    /// Runs `on_remove` against the final state.
    ///
    /// # Errors
    ///
    /// Returns whatever the hook returns.
    pub fn apply_remove(&self, entity: EntityId, state: &Value) -> EcsResult<()> {
        match &self.on_remove {
            Some(on_remove) => on_remove(entity, state),
            None => Ok(()),
        }
    }

    /// `to_json`, else the schema serializer, else a plain clone.
    #[must_use]
    pub fn serialize(&self, entity: EntityId, state: &Value) -> Option<Value> {
        if let Some(to_json) = &self.to_json {
            return to_json(entity, state);
        }
        match &self.schema {
            Some(schema) => schema::serialize(schema, state),
            None => Some(state.clone()),
        }
    }
}

impl fmt::Debug for ComponentDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDefinition")
            .field("name", &self.name)
            .field("json_id", &self.json_id)
            .field("schema", &self.schema)
            .field("reactor", &self.reactor.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`ComponentDefinition`].
#[must_use]
pub struct ComponentDefinitionBuilder {
    definition: ComponentDefinition,
}

impl ComponentDefinitionBuilder {
    /// Sets the json id.
    pub fn json_id(mut self, json_id: impl Into<String>) -> Self {
        self.definition.json_id = Some(json_id.into());
        self
    }

    /// Sets the schema.
    pub fn schema(mut self, schema: Schema) -> Self {
        self.definition.schema = Some(schema);
        self
    }

    /// Overrides the initial state.
    pub fn on_init<F>(mut self, hook: F) -> Self
    where
        F: Fn(EntityId) -> Value + Send + Sync + 'static,
    {
        self.definition.on_init = Some(Arc::new(hook));
        self
    }

    /// Overrides how incoming data is applied.
    pub fn on_set<F>(mut self, hook: F) -> Self
    where
        F: Fn(EntityId, &mut Value, Option<&Value>) -> EcsResult<()> + Send + Sync + 'static,
    {
        self.definition.on_set = Some(Arc::new(hook));
        self
    }

    /// Observes the final state before removal.
    pub fn on_remove<F>(mut self, hook: F) -> Self
    where
        F: Fn(EntityId, &Value) -> EcsResult<()> + Send + Sync + 'static,
    {
        self.definition.on_remove = Some(Arc::new(hook));
        self
    }

    /// Overrides serialization.
    pub fn to_json<F>(mut self, hook: F) -> Self
    where
        F: Fn(EntityId, &Value) -> Option<Value> + Send + Sync + 'static,
    {
        self.definition.to_json = Some(Arc::new(hook));
        self
    }

    /// Attaches a lifecycle effect.
    pub fn reactor<F>(mut self, effect: F) -> Self
    where
        F: Fn(&mut World, ReactorContext) -> Option<ReactorCleanup> + Send + Sync + 'static,
    {
        self.definition.reactor = Some(Arc::new(effect));
        self
    }

    /// Finishes the definition.
    #[must_use]
    pub fn build(self) -> ComponentDefinition {
        self.definition
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entity() -> EntityId {
        EntityId::new(0, 1)
    }

    fn health() -> ComponentDefinition {
        ComponentDefinition::builder("HealthComponent")
            .json_id("health")
            .schema(Schema::object([
                ("current", Schema::number()),
                ("max", Schema::number().with_default(json!(100.0))),
            ]))
            .build()
    }

    #[test]
    fn test_initial_value_from_schema() {
        assert_eq!(health().initial_value(entity()), json!({"current": 0.0, "max": 100.0}));
        let bare = ComponentDefinition::builder("Tag").build();
        assert_eq!(bare.initial_value(entity()), Value::Null);
    }

    #[test]
    fn test_apply_set_merges_objects() {
        let definition = health();
        let mut state = definition.initial_value(entity());
        definition
            .apply_set(entity(), &mut state, Some(&json!({"current": 40.0, "junk": 1})))
            .unwrap();
        assert_eq!(state, json!({"current": 40.0, "max": 100.0}));
    }

    #[test]
    fn test_apply_set_without_data_is_noop() {
        let definition = health();
        let mut state = definition.initial_value(entity());
        definition.apply_set(entity(), &mut state, None).unwrap();
        assert_eq!(state, json!({"current": 0.0, "max": 100.0}));
    }

    #[test]
    fn test_apply_set_replaces_single_values() {
        let definition = ComponentDefinition::builder("Name")
            .schema(Schema::string())
            .build();
        let mut state = definition.initial_value(entity());
        definition.apply_set(entity(), &mut state, Some(&json!("alpha"))).unwrap();
        assert_eq!(state, json!("alpha"));
        // Mistyped input keeps the previous value.
        definition.apply_set(entity(), &mut state, Some(&json!(5))).unwrap();
        assert_eq!(state, json!("alpha"));
    }

    #[test]
    fn test_apply_set_without_schema_replaces() {
        let definition = ComponentDefinition::builder("Blob").build();
        let mut state = Value::Null;
        definition.apply_set(entity(), &mut state, Some(&json!({"a": [1, 2]}))).unwrap();
        assert_eq!(state, json!({"a": [1, 2]}));
    }

    #[test]
    fn test_custom_hooks_take_priority() {
        let definition = ComponentDefinition::builder("Counter")
            .on_init(|_| json!(1))
            .on_set(|_, state, data| {
                let step = data.and_then(Value::as_i64).unwrap_or(1);
                *state = json!(state.as_i64().unwrap_or(0) + step);
                Ok(())
            })
            .to_json(|_, state| Some(json!({ "count": state })))
            .build();
        let mut state = definition.initial_value(entity());
        definition.apply_set(entity(), &mut state, Some(&json!(4))).unwrap();
        assert_eq!(state, json!(5));
        assert_eq!(definition.serialize(entity(), &state), Some(json!({"count": 5})));
    }
}
