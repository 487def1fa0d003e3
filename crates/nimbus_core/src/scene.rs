//! # Scene Extension Mapping
//!
//! Components persist in scene files as a node's `extensions` object, keyed
//! by json id: `{ "<jsonID>": <serialized component> }`.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::ecs::{EntityId, World};
use crate::error::EcsResult;

/// Serializes every attached component that has a json id.
#[must_use]
pub fn export_node_extensions(world: &World, entity: EntityId) -> Map<String, Value> {
    let mut extensions = Map::new();
    for kind in world.get_all_components(entity) {
        let Some(json_id) = kind.json_id() else {
            continue;
        };
        if let Some(value) = world.serialize_component(entity, &kind) {
            extensions.insert(json_id.to_string(), value);
        }
    }
    extensions
}

/// Routes each known extension through `set_component`.
///
/// Unknown json ids are skipped. Returns the number of components applied.
///
/// # Errors
///
/// Propagates the first `set_component` failure.
pub fn import_node_extensions(
    world: &mut World,
    entity: EntityId,
    extensions: &Map<String, Value>,
) -> EcsResult<usize> {
    let mut applied = 0;
    for (json_id, value) in extensions {
        let Some(kind) = world.registry().lookup_by_json_id(json_id) else {
            tracing::debug!(%entity, json_id = json_id.as_str(), "skipping unknown node extension");
            continue;
        };
        world.set_component(entity, &kind, Some(value.clone()))?;
        applied += 1;
    }
    Ok(applied)
}

/// Replaces every string leaf that names a mapped entity UUID.
///
/// Used when duplicating or re-importing a subtree. Returns the number of
/// strings rewritten.
pub fn rewrite_entity_references(value: &mut Value, uuid_map: &HashMap<String, String>) -> usize {
    match value {
        Value::String(text) => match uuid_map.get(text.as_str()) {
            Some(replacement) => {
                text.clone_from(replacement);
                1
            }
            None => 0,
        },
        Value::Array(items) => items
            .iter_mut()
            .map(|item| rewrite_entity_references(item, uuid_map))
            .sum(),
        Value::Object(map) => map
            .values_mut()
            .map(|item| rewrite_entity_references(item, uuid_map))
            .sum(),
        _ => 0,
    }
}
