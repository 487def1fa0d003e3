//! Pure operations over a [`Schema`].

use serde_json::{Map, Value};

use super::{Schema, SchemaKind};
use crate::ecs::EntityId;

/// Builds the default value for a schema.
///
/// An explicit `default` option short-circuits the recursion. Returns `None`
/// for kinds whose default is "absent".
#[must_use]
pub fn create_default(schema: &Schema) -> Option<Value> {
    if let Some(default) = &schema.options.default {
        return Some(default.produce());
    }

    match &schema.kind {
        SchemaKind::Null => Some(Value::Null),
        SchemaKind::Undefined | SchemaKind::Void | SchemaKind::Func | SchemaKind::Any => None,
        SchemaKind::Number => Some(Value::from(0.0)),
        SchemaKind::Bool => Some(Value::Bool(false)),
        SchemaKind::String => Some(Value::String(String::new())),
        SchemaKind::Enum(members) => members.first().cloned(),
        SchemaKind::Literal(value) => Some(value.clone()),
        SchemaKind::Object(props) | SchemaKind::Class(props) => {
            let mut map = Map::new();
            for (key, child) in props {
                if let Some(value) = create_default(child) {
                    map.insert(key.clone(), value);
                }
            }
            Some(Value::Object(map))
        }
        SchemaKind::Record { .. } => Some(Value::Object(Map::new())),
        SchemaKind::Array(_) => Some(Value::Array(Vec::new())),
        SchemaKind::Tuple(items) => Some(Value::Array(
            items
                .iter()
                .map(|item| create_default(item).unwrap_or(Value::Null))
                .collect(),
        )),
        SchemaKind::Union(members) => members.first().and_then(create_default),
        SchemaKind::Partial(inner)
        | SchemaKind::Required(inner)
        | SchemaKind::NonSerialized(inner) => create_default(inner),
    }
}

/// Deserializes `incoming` against `schema`, starting from `previous`.
///
/// Keys the schema does not declare are dropped. Terminal nodes return
/// `None` for absent or mistyped input so the caller keeps its previous
/// value.
#[must_use]
pub fn deserialize(schema: &Schema, previous: Option<&Value>, incoming: Option<&Value>) -> Option<Value> {
    let incoming = incoming?;

    if let Some(hook) = &schema.options.deserialize {
        return hook(previous, incoming);
    }

    match &schema.kind {
        SchemaKind::Null => incoming.is_null().then_some(Value::Null),
        SchemaKind::Undefined | SchemaKind::Void | SchemaKind::Func => None,
        SchemaKind::Number => incoming.is_number().then(|| incoming.clone()),
        SchemaKind::Bool => incoming.is_boolean().then(|| incoming.clone()),
        SchemaKind::String => incoming.is_string().then(|| incoming.clone()),
        SchemaKind::Enum(members) => members.contains(incoming).then(|| incoming.clone()),
        SchemaKind::Literal(value) => (value == incoming).then(|| incoming.clone()),
        SchemaKind::Any => Some(incoming.clone()),
        SchemaKind::Object(props) | SchemaKind::Class(props) => {
            let incoming = incoming.as_object()?;
            let mut out = match previous {
                Some(Value::Object(previous)) => previous.clone(),
                _ => Map::new(),
            };
            out.retain(|key, _| props.iter().any(|(name, _)| name == key));

            for (key, child) in props {
                if let Some(value) = deserialize(child, out.get(key), incoming.get(key)) {
                    out.insert(key.clone(), value);
                }
            }
            Some(Value::Object(out))
        }
        SchemaKind::Record { key: key_schema, value } => {
            let incoming = incoming.as_object()?;
            let mut out = match previous {
                Some(Value::Object(previous)) => previous.clone(),
                _ => Map::new(),
            };
            for (key, item) in incoming {
                // Keys arrive as strings; the key schema decides which survive.
                if deserialize(key_schema, None, Some(&Value::String(key.clone()))).is_none() {
                    continue;
                }
                if let Some(item) = deserialize(value, out.get(key), Some(item)) {
                    out.insert(key.clone(), item);
                }
            }
            Some(Value::Object(out))
        }
        SchemaKind::Array(item) => {
            let incoming = incoming.as_array()?;
            let previous = previous.and_then(Value::as_array);
            Some(Value::Array(
                incoming
                    .iter()
                    .enumerate()
                    .filter_map(|(index, value)| {
                        let prior = previous.and_then(|items| items.get(index));
                        deserialize(item, prior, Some(value))
                    })
                    .collect(),
            ))
        }
        SchemaKind::Tuple(items) => {
            let incoming = incoming.as_array()?;
            let previous = previous.and_then(Value::as_array);
            Some(Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| {
                        let prior = previous.and_then(|values| values.get(index));
                        deserialize(item, prior, incoming.get(index))
                            .or_else(|| prior.cloned())
                            .unwrap_or(Value::Null)
                    })
                    .collect(),
            ))
        }
        SchemaKind::Union(members) => members
            .iter()
            .find(|member| matches_shape(member, incoming))
            .and_then(|member| deserialize(member, previous, Some(incoming))),
        SchemaKind::Partial(inner)
        | SchemaKind::Required(inner)
        | SchemaKind::NonSerialized(inner) => deserialize(inner, previous, Some(incoming)),
    }
}

/// Whether `value` structurally belongs to `schema`. Picks the union member
/// a value is read and written with.
fn matches_shape(schema: &Schema, value: &Value) -> bool {
    if schema.options.deserialize.is_some() {
        return deserialize(schema, None, Some(value)).is_some();
    }
    match &schema.kind {
        SchemaKind::Null => value.is_null(),
        SchemaKind::Undefined | SchemaKind::Void | SchemaKind::Func => false,
        SchemaKind::Number => value.is_number(),
        SchemaKind::Bool => value.is_boolean(),
        SchemaKind::String => value.is_string(),
        SchemaKind::Enum(members) => members.contains(value),
        SchemaKind::Literal(literal) => literal == value,
        SchemaKind::Any => true,
        SchemaKind::Object(props) | SchemaKind::Class(props) => value.as_object().is_some_and(|map| {
            map.keys().all(|key| props.iter().any(|(name, _)| name == key))
                && props.iter().all(|(name, child)| match map.get(name) {
                    Some(item) => matches_shape(child, item),
                    None => !matches!(child.kind, SchemaKind::Required(_)),
                })
        }),
        SchemaKind::Record { key, value: item } => value.as_object().is_some_and(|map| {
            map.iter().all(|(name, entry)| {
                matches_shape(key, &Value::String(name.clone())) && matches_shape(item, entry)
            })
        }),
        SchemaKind::Array(item) => value
            .as_array()
            .is_some_and(|items| items.iter().all(|entry| matches_shape(item, entry))),
        SchemaKind::Tuple(items) => value.as_array().is_some_and(|values| {
            values.len() <= items.len()
                && items.iter().zip(values).all(|(item, entry)| matches_shape(item, entry))
        }),
        SchemaKind::Union(members) => members.iter().any(|member| matches_shape(member, value)),
        SchemaKind::Partial(inner) | SchemaKind::NonSerialized(inner) => matches_shape(inner, value),
        SchemaKind::Required(inner) => !value.is_null() && matches_shape(inner, value),
    }
}

/// Checks that every `Required` node has a non-null value.
///
/// # Errors
///
/// Returns the key segment of the first failing node.
pub fn check_required(schema: &Schema, value: Option<&Value>) -> Result<(), String> {
    required_at(schema, value, "")
}

fn required_at(schema: &Schema, value: Option<&Value>, key: &str) -> Result<(), String> {
    match &schema.kind {
        SchemaKind::Required(inner) => {
            if value.map_or(true, Value::is_null) {
                return Err(key.to_string());
            }
            required_at(inner, value, key)
        }
        SchemaKind::Object(props) | SchemaKind::Class(props) => {
            // An absent optional parent does not make its children missing.
            let Some(map) = value.and_then(Value::as_object) else {
                return Ok(());
            };
            for (name, child) in props {
                required_at(child, map.get(name), name)?;
            }
            Ok(())
        }
        SchemaKind::Partial(inner) | SchemaKind::NonSerialized(inner) => {
            required_at(inner, value, key)
        }
        _ => Ok(()),
    }
}

/// Runs every `validate` hook against the present parts of `value`.
///
/// # Errors
///
/// Returns the key segment of the first validator that rejects its value.
pub fn check_validators(
    schema: &Schema,
    value: Option<&Value>,
    previous: Option<&Value>,
    entity: EntityId,
) -> Result<(), String> {
    validators_at(schema, value, previous, entity, "")
}

fn validators_at(
    schema: &Schema,
    value: Option<&Value>,
    previous: Option<&Value>,
    entity: EntityId,
    key: &str,
) -> Result<(), String> {
    let Some(value) = value else {
        return Ok(());
    };

    if let Some(validate) = &schema.options.validate {
        if !validate(value, previous, entity) {
            return Err(key.to_string());
        }
    }

    match &schema.kind {
        SchemaKind::Object(props) | SchemaKind::Class(props) => {
            let Some(map) = value.as_object() else {
                return Ok(());
            };
            let previous = previous.and_then(Value::as_object);
            for (name, child) in props {
                let prior = previous.and_then(|prior| prior.get(name));
                validators_at(child, map.get(name), prior, entity, name)?;
            }
            Ok(())
        }
        SchemaKind::Partial(inner)
        | SchemaKind::Required(inner)
        | SchemaKind::NonSerialized(inner) => {
            validators_at(inner, Some(value), previous, entity, key)
        }
        _ => Ok(()),
    }
}

/// Whether a set replaces the whole value instead of merging into it.
#[must_use]
pub fn is_single_value(schema: &Schema) -> bool {
    match &schema.kind {
        SchemaKind::Null
        | SchemaKind::Undefined
        | SchemaKind::Void
        | SchemaKind::Number
        | SchemaKind::Bool
        | SchemaKind::String
        | SchemaKind::Enum(_)
        | SchemaKind::Literal(_)
        | SchemaKind::Array(_)
        | SchemaKind::Tuple(_)
        | SchemaKind::Class(_)
        | SchemaKind::Func => true,
        SchemaKind::Object(_)
        | SchemaKind::Record { .. }
        | SchemaKind::Partial(_)
        | SchemaKind::Any => false,
        SchemaKind::Union(members) => {
            !members.is_empty() && members.iter().all(is_single_value)
        }
        SchemaKind::Required(inner) | SchemaKind::NonSerialized(inner) => is_single_value(inner),
    }
}

/// Converts a runtime value into its wire form.
///
/// `Func` and `NonSerialized` branches are omitted; per-node `serialize`
/// hooks replace the structural walk for their subtree.
#[must_use]
pub fn serialize(schema: &Schema, value: &Value) -> Option<Value> {
    match &schema.kind {
        SchemaKind::Func | SchemaKind::NonSerialized(_) | SchemaKind::Undefined | SchemaKind::Void => {
            return None
        }
        _ => {}
    }

    if let Some(hook) = &schema.options.serialize {
        return hook(value);
    }

    match &schema.kind {
        SchemaKind::Object(props) | SchemaKind::Class(props) => {
            let Some(map) = value.as_object() else {
                return Some(value.clone());
            };
            let mut out = Map::new();
            for (key, child) in props {
                if let Some(serialized) = map.get(key).and_then(|item| serialize(child, item)) {
                    out.insert(key.clone(), serialized);
                }
            }
            Some(Value::Object(out))
        }
        SchemaKind::Record { value: item, .. } => {
            let Some(map) = value.as_object() else {
                return Some(value.clone());
            };
            let out = map
                .iter()
                .filter_map(|(key, entry)| serialize(item, entry).map(|entry| (key.clone(), entry)))
                .collect();
            Some(Value::Object(out))
        }
        SchemaKind::Array(item) => {
            let Some(items) = value.as_array() else {
                return Some(value.clone());
            };
            Some(Value::Array(
                items
                    .iter()
                    .map(|entry| serialize(item, entry).unwrap_or(Value::Null))
                    .collect(),
            ))
        }
        SchemaKind::Tuple(items) => {
            let Some(values) = value.as_array() else {
                return Some(value.clone());
            };
            Some(Value::Array(
                items
                    .iter()
                    .zip(values)
                    .map(|(item, entry)| serialize(item, entry).unwrap_or(Value::Null))
                    .collect(),
            ))
        }
        SchemaKind::Union(members) => {
            let member = members.iter().find(|member| matches_shape(member, value));
            match member {
                Some(member) => serialize(member, value),
                None => Some(value.clone()),
            }
        }
        SchemaKind::Partial(inner) | SchemaKind::Required(inner) => serialize(inner, value),
        _ => Some(value.clone()),
    }
}
