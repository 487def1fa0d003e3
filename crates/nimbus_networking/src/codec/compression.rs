//! # Quantization and Bit Packing
//!
//! Lossy fixed-width encodings for transform data.
//!
//! ## Layouts
//!
//! ```text
//! vector3  u64: [unused:1][z:21][y:21][x:21]
//! rotation u32: [dropped:2][a:10][b:10][c:10]
//! ```
//!
//! Rotations use the smallest-three technique: the largest component is
//! dropped and rebuilt from the unit-length constraint.

use std::f64::consts::FRAC_1_SQRT_2;

use nimbus_shared::{Quaternion, Vec3};

/// Bits per vector axis.
pub const VECTOR_AXIS_BITS: u32 = 21;

/// Bits per kept quaternion component.
pub const ROTATION_COMPONENT_BITS: u32 = 10;

const VECTOR_AXIS_MAX: u64 = (1 << VECTOR_AXIS_BITS) - 1;
const ROTATION_COMPONENT_MAX: u32 = (1 << ROTATION_COMPONENT_BITS) - 1;

/// Maps `value` from `[min, max]` onto `0..=max_int`.
#[inline]
fn quantize(value: f64, min: f64, max: f64, max_int: u64) -> u64 {
    let range = max - min;
    if range <= 0.0 || !value.is_finite() {
        return 0;
    }
    let normalized = ((value - min) / range).clamp(0.0, 1.0);
    (normalized * max_int as f64).round() as u64
}

#[inline]
fn dequantize(quantized: u64, min: f64, max: f64, max_int: u64) -> f64 {
    min + (quantized as f64 / max_int as f64) * (max - min)
}

/// Packs a vector quantized over `[-range, range]` per axis.
///
/// Values outside the range are clamped to it.
#[must_use]
pub fn pack_vec3(v: Vec3, range: f64) -> u64 {
    v.to_array()
        .iter()
        .enumerate()
        .fold(0, |packed, (axis, &value)| {
            packed | quantize(value, -range, range, VECTOR_AXIS_MAX) << (axis as u32 * VECTOR_AXIS_BITS)
        })
}

/// Inverse of [`pack_vec3`].
#[must_use]
pub fn unpack_vec3(packed: u64, range: f64) -> Vec3 {
    let mut axes = [0.0; 3];
    for (axis, slot) in axes.iter_mut().enumerate() {
        let quantized = (packed >> (axis as u32 * VECTOR_AXIS_BITS)) & VECTOR_AXIS_MAX;
        *slot = dequantize(quantized, -range, range, VECTOR_AXIS_MAX);
    }
    Vec3::from_array(axes)
}

/// Packs a rotation with the smallest-three encoding.
///
/// The input is normalized first. `q` and `-q` encode identically since they
/// describe the same rotation.
#[must_use]
pub fn pack_quaternion(q: Quaternion) -> u32 {
    let mut components = q.normalize().to_array();

    let mut dropped = 0;
    for index in 1..4 {
        if components[index].abs() > components[dropped].abs() {
            dropped = index;
        }
    }
    if components[dropped] < 0.0 {
        for component in &mut components {
            *component = -*component;
        }
    }

    let mut packed = (dropped as u32) << (3 * ROTATION_COMPONENT_BITS);
    let mut slot = 3;
    for (index, &component) in components.iter().enumerate() {
        if index == dropped {
            continue;
        }
        slot -= 1;
        let quantized = quantize(
            component,
            -FRAC_1_SQRT_2,
            FRAC_1_SQRT_2,
            u64::from(ROTATION_COMPONENT_MAX),
        ) as u32;
        packed |= quantized << (slot * ROTATION_COMPONENT_BITS);
    }
    packed
}

/// Inverse of [`pack_quaternion`].
#[must_use]
pub fn unpack_quaternion(packed: u32) -> Quaternion {
    let dropped = (packed >> (3 * ROTATION_COMPONENT_BITS)) as usize & 0b11;

    let mut components = [0.0; 4];
    let mut sum_squares = 0.0;
    let mut slot = 3;
    for (index, component) in components.iter_mut().enumerate() {
        if index == dropped {
            continue;
        }
        slot -= 1;
        let quantized = (packed >> (slot * ROTATION_COMPONENT_BITS)) & ROTATION_COMPONENT_MAX;
        *component = dequantize(
            u64::from(quantized),
            -FRAC_1_SQRT_2,
            FRAC_1_SQRT_2,
            u64::from(ROTATION_COMPONENT_MAX),
        );
        sum_squares += *component * *component;
    }
    components[dropped] = (1.0 - sum_squares).max(0.0).sqrt();
    Quaternion::from_array(components)
}
