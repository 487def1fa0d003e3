//! Dotted property paths over component state (`"transform.position.x"`).

use serde_json::{Map, Value};

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('.').filter(|segment| !segment.is_empty())
}

fn child<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|index| items.get(index)),
        _ => None,
    }
}

fn child_mut<'a>(value: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    match value {
        Value::Object(map) => map.get_mut(segment),
        Value::Array(items) => segment
            .parse::<usize>()
            .ok()
            .and_then(move |index| items.get_mut(index)),
        _ => None,
    }
}

/// Reads the value at a dotted path. An empty path is the root.
#[must_use]
pub fn get_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    segments(path).try_fold(root, child)
}

/// Mutable access to the value at a dotted path.
pub fn get_path_mut<'a>(root: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    segments(path).try_fold(root, child_mut)
}

/// Assigns `value` at a dotted path, creating intermediate objects.
///
/// Non-object intermediates are replaced by objects.
pub fn assign_path(root: &mut Value, path: &str, value: Value) {
    let mut target = root;
    for segment in segments(path) {
        let index = match &*target {
            Value::Array(items) => segment
                .parse::<usize>()
                .ok()
                .filter(|&index| index < items.len()),
            _ => None,
        };
        target = match (index, target) {
            (Some(index), Value::Array(items)) => &mut items[index],
            (_, slot) => {
                if !slot.is_object() {
                    *slot = Value::Object(Map::new());
                }
                match slot {
                    Value::Object(map) => map.entry(segment.to_string()).or_insert(Value::Null),
                    other => other,
                }
            }
        };
    }
    *target = value;
}

/// Deep-merges `source` into `target`.
///
/// Objects merge key by key; anything else is assigned.
pub fn merge(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, source) => *target = source,
    }
}

/// Merges `value` into whatever lives at `path`.
pub fn merge_path(root: &mut Value, path: &str, value: Value) {
    let mergeable = value.is_object() && get_path(root, path).is_some_and(Value::is_object);
    if !mergeable {
        assign_path(root, path, value);
    } else if let Some(existing) = get_path_mut(root, path) {
        merge(existing, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_path() {
        let value = json!({"a": {"b": [10, {"c": 3}]}});
        assert_eq!(get_path(&value, "a.b.1.c"), Some(&json!(3)));
        assert_eq!(get_path(&value, ""), Some(&value));
        assert_eq!(get_path(&value, "a.missing"), None);
    }

    #[test]
    fn test_assign_path_creates_objects() {
        let mut value = json!({"a": 1});
        assign_path(&mut value, "b.c.d", json!(true));
        assert_eq!(value, json!({"a": 1, "b": {"c": {"d": true}}}));
        assign_path(&mut value, "a.x", json!(2));
        assert_eq!(value["a"], json!({"x": 2}));
    }

    #[test]
    fn test_assign_path_into_array() {
        let mut value = json!({"list": [1, 2, 3]});
        assign_path(&mut value, "list.1", json!(9));
        assert_eq!(value, json!({"list": [1, 9, 3]}));
    }

    #[test]
    fn test_merge_path_is_deep() {
        let mut value = json!({"t": {"p": {"x": 1.0, "y": 2.0}, "s": 1.0}});
        merge_path(&mut value, "t", json!({"p": {"x": 5.0}}));
        assert_eq!(value, json!({"t": {"p": {"x": 5.0, "y": 2.0}, "s": 1.0}}));
        merge_path(&mut value, "t.s", json!({"uniform": 2.0}));
        assert_eq!(value["t"]["s"], json!({"uniform": 2.0}));
    }
}
