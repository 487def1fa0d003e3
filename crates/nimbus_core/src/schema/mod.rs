//! # Schema Engine
//!
//! Recursive description of a component's serializable shape.
//!
//! A [`Schema`] is a node of the closed [`SchemaKind`] sum type plus optional
//! per-node hooks. Runtime values are [`serde_json::Value`]; an absent value
//! ("undefined") is `None`.
//!
//! ```text
//! Object { position: Object { x: Number, y: Number, z: Number },
//!          name:     Required(String),
//!          handle:   NonSerialized(Any) }
//! ```
//!
//! The operations in [`ops`] never touch the ECS. The only ECS type they see
//! is the opaque [`EntityId`] handed to validators.

mod ops;

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::ecs::EntityId;

pub use ops::{
    check_required, check_validators, create_default, deserialize, is_single_value, serialize,
};

/// Produces a default value.
pub type DefaultFactory = Arc<dyn Fn() -> Value + Send + Sync>;

/// Custom deserializer: `(previous, incoming) -> value`.
pub type DeserializeHook = Arc<dyn Fn(Option<&Value>, &Value) -> Option<Value> + Send + Sync>;

/// Custom serializer: `value -> wire value`. `None` omits the branch.
pub type SerializeHook = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

/// Custom validator: `(value, previous, entity) -> valid`.
pub type ValidateHook = Arc<dyn Fn(&Value, Option<&Value>, EntityId) -> bool + Send + Sync>;

/// Explicit default declared on a schema node.
#[derive(Clone)]
pub enum DefaultValue {
    /// A fixed value, cloned on use.
    Value(Value),
    /// A factory invoked on use.
    Factory(DefaultFactory),
}

impl DefaultValue {
    /// Produces the default value.
    #[must_use]
    pub fn produce(&self) -> Value {
        match self {
            Self::Value(value) => value.clone(),
            Self::Factory(factory) => factory(),
        }
    }
}

/// Per-node options.
#[derive(Clone, Default)]
pub struct SchemaOptions {
    /// Short-circuits [`create_default`].
    pub default: Option<DefaultValue>,
    /// Replaces the structural deserializer for this node.
    pub deserialize: Option<DeserializeHook>,
    /// Replaces the structural serializer for this node.
    pub serialize: Option<SerializeHook>,
    /// Extra validation run by [`check_validators`].
    pub validate: Option<ValidateHook>,
}

/// Closed set of schema node kinds.
#[derive(Clone)]
pub enum SchemaKind {
    /// `null`
    Null,
    /// Absent value.
    Undefined,
    /// Absent value, used for function returns.
    Void,
    /// Any JSON number.
    Number,
    /// `true`/`false`
    Bool,
    /// Any string.
    String,
    /// One of a fixed set of values.
    Enum(Vec<Value>),
    /// Exactly this value.
    Literal(Value),
    /// Anything, passed through untouched.
    Any,
    /// Keyed properties, merged on set.
    Object(Vec<(String, Schema)>),
    /// Keyed properties of an atomic instance, replaced on set.
    Class(Vec<(String, Schema)>),
    /// Free-form keys sharing one value schema.
    Record {
        /// Key schema (keys are strings on the wire).
        key: Box<Schema>,
        /// Value schema.
        value: Box<Schema>,
    },
    /// Inner object whose keys are all optional.
    Partial(Box<Schema>),
    /// Inner value must be present and non-null.
    Required(Box<Schema>),
    /// Runtime-only value, dropped by [`serialize`].
    NonSerialized(Box<Schema>),
    /// Homogeneous list.
    Array(Box<Schema>),
    /// Fixed-length positional list.
    Tuple(Vec<Schema>),
    /// First matching member wins.
    Union(Vec<Schema>),
    /// Callable, never serialized.
    Func,
}

impl SchemaKind {
    /// Kind name, as used in diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Undefined => "Undefined",
            Self::Void => "Void",
            Self::Number => "Number",
            Self::Bool => "Bool",
            Self::String => "String",
            Self::Enum(_) => "Enum",
            Self::Literal(_) => "Literal",
            Self::Any => "Any",
            Self::Object(_) => "Object",
            Self::Class(_) => "Class",
            Self::Record { .. } => "Record",
            Self::Partial(_) => "Partial",
            Self::Required(_) => "Required",
            Self::NonSerialized(_) => "NonSerialized",
            Self::Array(_) => "Array",
            Self::Tuple(_) => "Tuple",
            Self::Union(_) => "Union",
            Self::Func => "Func",
        }
    }
}

/// A schema node: kind plus options.
#[derive(Clone)]
pub struct Schema {
    kind: SchemaKind,
    options: SchemaOptions,
}

fn props<I, K>(properties: I) -> Vec<(String, Schema)>
where
    I: IntoIterator<Item = (K, Schema)>,
    K: Into<String>,
{
    properties
        .into_iter()
        .map(|(key, schema)| (key.into(), schema))
        .collect()
}

impl Schema {
    /// Wraps a kind with empty options.
    #[must_use]
    pub fn new(kind: SchemaKind) -> Self {
        Self {
            kind,
            options: SchemaOptions::default(),
        }
    }

    /// The node kind.
    #[must_use]
    pub const fn kind(&self) -> &SchemaKind {
        &self.kind
    }

    /// The node options.
    #[must_use]
    pub const fn options(&self) -> &SchemaOptions {
        &self.options
    }

    /// `null` schema.
    #[must_use]
    pub fn null() -> Self {
        Self::new(SchemaKind::Null)
    }

    /// Absent-value schema.
    #[must_use]
    pub fn undefined() -> Self {
        Self::new(SchemaKind::Undefined)
    }

    /// Void schema.
    #[must_use]
    pub fn void() -> Self {
        Self::new(SchemaKind::Void)
    }

    /// Number schema.
    #[must_use]
    pub fn number() -> Self {
        Self::new(SchemaKind::Number)
    }

    /// Boolean schema.
    #[must_use]
    pub fn bool() -> Self {
        Self::new(SchemaKind::Bool)
    }

    /// String schema.
    #[must_use]
    pub fn string() -> Self {
        Self::new(SchemaKind::String)
    }

    /// Enum schema over the given members.
    #[must_use]
    pub fn enumeration<I: IntoIterator<Item = Value>>(members: I) -> Self {
        Self::new(SchemaKind::Enum(members.into_iter().collect()))
    }

    /// Literal schema.
    #[must_use]
    pub fn literal(value: Value) -> Self {
        Self::new(SchemaKind::Literal(value))
    }

    /// Pass-through schema.
    #[must_use]
    pub fn any() -> Self {
        Self::new(SchemaKind::Any)
    }

    /// Object schema with ordered properties.
    #[must_use]
    pub fn object<I, K>(properties: I) -> Self
    where
        I: IntoIterator<Item = (K, Schema)>,
        K: Into<String>,
    {
        Self::new(SchemaKind::Object(props(properties)))
    }

    /// Class schema with ordered properties.
    #[must_use]
    pub fn class<I, K>(properties: I) -> Self
    where
        I: IntoIterator<Item = (K, Schema)>,
        K: Into<String>,
    {
        Self::new(SchemaKind::Class(props(properties)))
    }

    /// Record schema.
    #[must_use]
    pub fn record(key: Schema, value: Schema) -> Self {
        Self::new(SchemaKind::Record {
            key: Box::new(key),
            value: Box::new(value),
        })
    }

    /// Partial wrapper.
    #[must_use]
    pub fn partial(inner: Schema) -> Self {
        Self::new(SchemaKind::Partial(Box::new(inner)))
    }

    /// Required wrapper.
    #[must_use]
    pub fn required(inner: Schema) -> Self {
        Self::new(SchemaKind::Required(Box::new(inner)))
    }

    /// Runtime-only wrapper.
    #[must_use]
    pub fn non_serialized(inner: Schema) -> Self {
        Self::new(SchemaKind::NonSerialized(Box::new(inner)))
    }

    /// Array schema.
    #[must_use]
    pub fn array(item: Schema) -> Self {
        Self::new(SchemaKind::Array(Box::new(item)))
    }

    /// Tuple schema.
    #[must_use]
    pub fn tuple<I: IntoIterator<Item = Schema>>(items: I) -> Self {
        Self::new(SchemaKind::Tuple(items.into_iter().collect()))
    }

    /// Union schema.
    #[must_use]
    pub fn union<I: IntoIterator<Item = Schema>>(members: I) -> Self {
        Self::new(SchemaKind::Union(members.into_iter().collect()))
    }

    /// Function schema.
    #[must_use]
    pub fn func() -> Self {
        Self::new(SchemaKind::Func)
    }

    /// `{x, y}` number object.
    #[must_use]
    pub fn vec2() -> Self {
        Self::class([("x", Self::number()), ("y", Self::number())])
    }

    /// `{x, y, z}` number object.
    #[must_use]
    pub fn vec3() -> Self {
        Self::class([
            ("x", Self::number()),
            ("y", Self::number()),
            ("z", Self::number()),
        ])
    }

    /// `{x, y, z, w}` number object defaulting to the identity rotation.
    #[must_use]
    pub fn quaternion() -> Self {
        Self::class([
            ("x", Self::number()),
            ("y", Self::number()),
            ("z", Self::number()),
            ("w", Self::number()),
        ])
        .with_default(serde_json::json!({"x": 0.0, "y": 0.0, "z": 0.0, "w": 1.0}))
    }

    /// `{r, g, b}` number object defaulting to white.
    #[must_use]
    pub fn color() -> Self {
        Self::class([
            ("r", Self::number()),
            ("g", Self::number()),
            ("b", Self::number()),
        ])
        .with_default(serde_json::json!({"r": 1.0, "g": 1.0, "b": 1.0}))
    }

    /// Sets a fixed default.
    #[must_use]
    pub fn with_default(mut self, value: Value) -> Self {
        self.options.default = Some(DefaultValue::Value(value));
        self
    }

    /// Sets a default factory.
    #[must_use]
    pub fn with_default_fn<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.options.default = Some(DefaultValue::Factory(Arc::new(factory)));
        self
    }

    /// Sets a deserialize hook.
    #[must_use]
    pub fn with_deserialize<F>(mut self, hook: F) -> Self
    where
        F: Fn(Option<&Value>, &Value) -> Option<Value> + Send + Sync + 'static,
    {
        self.options.deserialize = Some(Arc::new(hook));
        self
    }

    /// Sets a serialize hook.
    #[must_use]
    pub fn with_serialize<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    {
        self.options.serialize = Some(Arc::new(hook));
        self
    }

    /// Sets a validator.
    #[must_use]
    pub fn with_validate<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Value, Option<&Value>, EntityId) -> bool + Send + Sync + 'static,
    {
        self.options.validate = Some(Arc::new(hook));
        self
    }

    /// Looks up a direct property of an Object/Class node, looking through
    /// wrappers.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&Schema> {
        match &self.kind {
            SchemaKind::Object(props) | SchemaKind::Class(props) => props
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, schema)| schema),
            SchemaKind::Record { value, .. } => Some(value),
            SchemaKind::Partial(inner)
            | SchemaKind::Required(inner)
            | SchemaKind::NonSerialized(inner) => inner.property(key),
            _ => None,
        }
    }

    /// Resolves a dotted property path.
    #[must_use]
    pub fn at_path(&self, path: &str) -> Option<&Schema> {
        path.split('.')
            .filter(|segment| !segment.is_empty())
            .try_fold(self, |schema, segment| schema.property(segment))
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Schema");
        out.field("kind", &self.kind.name());
        match &self.kind {
            SchemaKind::Object(props) | SchemaKind::Class(props) => {
                let keys: Vec<&str> = props.iter().map(|(key, _)| key.as_str()).collect();
                out.field("properties", &keys);
            }
            SchemaKind::Partial(inner)
            | SchemaKind::Required(inner)
            | SchemaKind::NonSerialized(inner)
            | SchemaKind::Array(inner) => {
                out.field("inner", inner);
            }
            _ => {}
        }
        out.finish_non_exhaustive()
    }
}
