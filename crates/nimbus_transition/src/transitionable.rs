//! # Transitionable Types
//!
//! A transitionable type recognizes a value's runtime shape and knows how to
//! interpolate between two such values. Types are tried in registration
//! order, so narrower shapes must be registered before wider ones.

use std::sync::Arc;

use nimbus_shared::{lerp, Color, Quaternion, Vec2, Vec3};
use serde_json::{json, Map, Value};

use crate::error::{TransitionError, TransitionResult};

/// A value kind the engine can interpolate.
pub trait Transitionable: Send + Sync {
    /// Registry name (`"vector3"`).
    fn name(&self) -> &'static str;

    /// Whether `value` has this type's shape.
    fn is_type(&self, value: &Value) -> bool;

    /// Interpolates between `from` and `to` at eased progress `t`.
    fn interpolate(&self, from: &Value, to: &Value, t: f64) -> Value;
}

fn number(value: &Value, key: &str) -> Option<f64> {
    value.get(key).and_then(Value::as_f64)
}

/// Object carrying exactly `keys`, each a number.
fn has_exact_numbers(value: &Value, keys: &[&str]) -> bool {
    value.as_object().is_some_and(|map| {
        map.len() == keys.len() && keys.iter().all(|key| map.get(*key).is_some_and(Value::is_number))
    })
}

fn to_vec2(value: &Value) -> Option<Vec2> {
    Some(Vec2::new(number(value, "x")?, number(value, "y")?))
}

fn to_vec3(value: &Value) -> Option<Vec3> {
    Some(Vec3::new(number(value, "x")?, number(value, "y")?, number(value, "z")?))
}

fn to_quaternion(value: &Value) -> Option<Quaternion> {
    Some(Quaternion::new(
        number(value, "x")?,
        number(value, "y")?,
        number(value, "z")?,
        number(value, "w")?,
    ))
}

fn to_color(value: &Value) -> Option<Color> {
    Some(Color::new(number(value, "r")?, number(value, "g")?, number(value, "b")?))
}

/// Scalar lerp.
pub struct NumberType;

impl Transitionable for NumberType {
    fn name(&self) -> &'static str {
        "number"
    }

    fn is_type(&self, value: &Value) -> bool {
        value.is_number()
    }

    fn interpolate(&self, from: &Value, to: &Value, t: f64) -> Value {
        match (from.as_f64(), to.as_f64()) {
            (Some(from), Some(to)) => json!(lerp(from, to, t)),
            _ => to.clone(),
        }
    }
}

/// `{x, y}` per-axis lerp.
pub struct Vector2Type;

impl Transitionable for Vector2Type {
    fn name(&self) -> &'static str {
        "vector2"
    }

    fn is_type(&self, value: &Value) -> bool {
        has_exact_numbers(value, &["x", "y"])
    }

    fn interpolate(&self, from: &Value, to: &Value, t: f64) -> Value {
        match (to_vec2(from), to_vec2(to)) {
            (Some(from), Some(to)) => {
                let out = from.lerp(to, t);
                json!({"x": out.x, "y": out.y})
            }
            _ => to.clone(),
        }
    }
}

/// `{x, y, z}` per-axis lerp.
pub struct Vector3Type;

impl Transitionable for Vector3Type {
    fn name(&self) -> &'static str {
        "vector3"
    }

    fn is_type(&self, value: &Value) -> bool {
        has_exact_numbers(value, &["x", "y", "z"])
    }

    fn interpolate(&self, from: &Value, to: &Value, t: f64) -> Value {
        match (to_vec3(from), to_vec3(to)) {
            (Some(from), Some(to)) => {
                let out = from.lerp(to, t);
                json!({"x": out.x, "y": out.y, "z": out.z})
            }
            _ => to.clone(),
        }
    }
}

/// `{x, y, z, w}` spherical interpolation.
pub struct QuaternionType;

impl Transitionable for QuaternionType {
    fn name(&self) -> &'static str {
        "quaternion"
    }

    fn is_type(&self, value: &Value) -> bool {
        has_exact_numbers(value, &["x", "y", "z", "w"])
    }

    fn interpolate(&self, from: &Value, to: &Value, t: f64) -> Value {
        match (to_quaternion(from), to_quaternion(to)) {
            (Some(from), Some(to)) => {
                let out = from.slerp(to, t);
                json!({"x": out.x, "y": out.y, "z": out.z, "w": out.w})
            }
            _ => to.clone(),
        }
    }
}

/// `{r, g, b}` per-channel lerp.
pub struct ColorType;

impl Transitionable for ColorType {
    fn name(&self) -> &'static str {
        "color"
    }

    fn is_type(&self, value: &Value) -> bool {
        has_exact_numbers(value, &["r", "g", "b"])
    }

    fn interpolate(&self, from: &Value, to: &Value, t: f64) -> Value {
        match (to_color(from), to_color(to)) {
            (Some(from), Some(to)) => {
                let out = from.lerp(to, t);
                json!({"r": out.r, "g": out.g, "b": out.b})
            }
            _ => to.clone(),
        }
    }
}

/// `{r, g, b}` interpolated in HSL space.
///
/// Shares the color shape check, so it is only picked by explicit name.
pub struct ColorHslType;

impl Transitionable for ColorHslType {
    fn name(&self) -> &'static str {
        "colorHSL"
    }

    fn is_type(&self, value: &Value) -> bool {
        has_exact_numbers(value, &["r", "g", "b"])
    }

    fn interpolate(&self, from: &Value, to: &Value, t: f64) -> Value {
        match (to_color(from), to_color(to)) {
            (Some(from), Some(to)) => {
                let out = from.lerp_hsl(to, t);
                json!({"r": out.r, "g": out.g, "b": out.b})
            }
            _ => to.clone(),
        }
    }
}

/// Ordered catalog of transitionable types.
#[derive(Clone)]
pub struct TransitionableRegistry {
    types: Vec<Arc<dyn Transitionable>>,
}

impl Default for TransitionableRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl TransitionableRegistry {
    /// Empty catalog.
    #[must_use]
    pub fn empty() -> Self {
        Self { types: Vec::new() }
    }

    /// Number, vector2, vector3, quaternion, color, colorHSL.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(NumberType));
        registry.register(Arc::new(Vector2Type));
        registry.register(Arc::new(Vector3Type));
        registry.register(Arc::new(QuaternionType));
        registry.register(Arc::new(ColorType));
        registry.register(Arc::new(ColorHslType));
        registry
    }

    /// Appends a type. Later registrations are tried last.
    pub fn register(&mut self, transitionable: Arc<dyn Transitionable>) {
        self.types.push(transitionable);
    }

    /// Looks up a type by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Transitionable>> {
        self.types.iter().find(|candidate| candidate.name() == name)
    }

    /// Resolves the type for `value`, by explicit name or by probing.
    ///
    /// # Errors
    ///
    /// - [`TransitionError::UnknownTransitionableType`] for an unregistered name
    /// - [`TransitionError::UnresolvedType`] when no type accepts the value
    /// - [`TransitionError::TypeMismatch`] when the named type rejects the value
    pub fn resolve(&self, value: &Value, explicit: Option<&str>) -> TransitionResult<&Arc<dyn Transitionable>> {
        let resolved = match explicit {
            Some(name) => self
                .get(name)
                .ok_or_else(|| TransitionError::UnknownTransitionableType(name.to_string()))?,
            None => self
                .types
                .iter()
                .find(|candidate| candidate.is_type(value))
                .ok_or(TransitionError::UnresolvedType)?,
        };

        if !resolved.is_type(value) {
            return Err(TransitionError::TypeMismatch {
                type_name: resolved.name().to_string(),
            });
        }
        Ok(resolved)
    }
}

/// Writes `output` onto `target`.
///
/// Objects are updated field by field so the target keeps its identity and
/// any extra keys; everything else is replaced.
pub fn write_back(target: &mut Value, output: &Value) {
    if let Value::Object(source) = output {
        if let Some(fields) = target.as_object_mut() {
            copy_fields(fields, source);
            return;
        }
    }
    *target = output.clone();
}

fn copy_fields(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, value) in source {
        target.insert(key.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_order() {
        let registry = TransitionableRegistry::with_defaults();
        let name = |value: Value| registry.resolve(&value, None).unwrap().name();
        assert_eq!(name(json!(1.5)), "number");
        assert_eq!(name(json!({"x": 1.0, "y": 2.0})), "vector2");
        assert_eq!(name(json!({"x": 1.0, "y": 2.0, "z": 3.0})), "vector3");
        assert_eq!(name(json!({"x": 0.0, "y": 0.0, "z": 0.0, "w": 1.0})), "quaternion");
        assert_eq!(name(json!({"r": 1.0, "g": 0.0, "b": 0.0})), "color");
    }

    #[test]
    fn test_resolve_errors() {
        let registry = TransitionableRegistry::with_defaults();
        assert_eq!(
            registry.resolve(&json!("text"), None).err(),
            Some(TransitionError::UnresolvedType)
        );
        assert_eq!(
            registry.resolve(&json!(1.0), Some("matrix")).err(),
            Some(TransitionError::UnknownTransitionableType("matrix".to_string()))
        );
        assert_eq!(
            registry.resolve(&json!(1.0), Some("vector3")).err(),
            Some(TransitionError::TypeMismatch { type_name: "vector3".to_string() })
        );
        assert_eq!(
            registry
                .resolve(&json!({"r": 1.0, "g": 0.0, "b": 0.0}), Some("colorHSL"))
                .unwrap()
                .name(),
            "colorHSL"
        );
    }

    #[test]
    fn test_interpolate_vectors() {
        let out = Vector3Type.interpolate(
            &json!({"x": 0.0, "y": 0.0, "z": 0.0}),
            &json!({"x": 2.0, "y": 4.0, "z": -2.0}),
            0.5,
        );
        assert_eq!(out, json!({"x": 1.0, "y": 2.0, "z": -1.0}));
    }

    #[test]
    fn test_interpolate_quaternion_stays_unit() {
        let out = QuaternionType.interpolate(
            &json!({"x": 0.0, "y": 0.0, "z": 0.0, "w": 1.0}),
            &json!({"x": 0.0, "y": 1.0, "z": 0.0, "w": 0.0}),
            0.5,
        );
        let q = to_quaternion(&out).unwrap();
        assert!((q.length() - 1.0).abs() < 1e-9);
        assert!((q.y - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-9);
    }

    #[test]
    fn test_write_back_keeps_extra_keys() {
        let mut target = json!({"x": 0.0, "y": 0.0, "z": 0.0, "dirty": true});
        write_back(&mut target, &json!({"x": 1.0, "y": 2.0, "z": 3.0}));
        assert_eq!(target, json!({"x": 1.0, "y": 2.0, "z": 3.0, "dirty": true}));

        let mut scalar = json!(1.0);
        write_back(&mut scalar, &json!(2.0));
        assert_eq!(scalar, json!(2.0));
    }
}
