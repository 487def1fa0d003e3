//! # Dense Components
//!
//! Plain-data components stored in typed columns, one slot per entity index.
//! Replicated transform data lives here rather than in schema state.

use bytemuck::{Pod, Zeroable};
use nimbus_shared::{Quaternion, Vec3};

/// Marker trait for dense components.
///
/// Components must be:
/// - `Pod`: Plain old data, bitwise copyable
/// - `Default`: Slots are reset to the default value
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Clone, Copy, Default, Pod, Zeroable)]
/// #[repr(C)]
/// struct Health {
///     current: f64,
/// }
///
/// impl Component for Health {
///     const NAME: &'static str = "Health";
/// }
/// ```
pub trait Component: Pod + Default + Send + Sync + 'static {
    /// Name used in diagnostics.
    const NAME: &'static str;
}

/// World-space position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Position {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate.
    pub z: f64,
}

impl Component for Position {
    const NAME: &'static str = "Position";
}

impl Position {
    /// Position from world-space coordinates.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// As a vector.
    #[inline]
    #[must_use]
    pub const fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Squared distance to `other`.
    #[inline]
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        (self.to_vec3() - other.to_vec3()).length_squared()
    }
}

/// World-space rotation, stored as a unit quaternion.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Rotation {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
    /// W component.
    pub w: f64,
}

impl Default for Rotation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Component for Rotation {
    const NAME: &'static str = "Rotation";
}

impl Rotation {
    /// No rotation.
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Creates a new rotation.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// As a quaternion.
    #[inline]
    #[must_use]
    pub const fn to_quaternion(self) -> Quaternion {
        Quaternion::new(self.x, self.y, self.z, self.w)
    }

    /// From a quaternion.
    #[inline]
    #[must_use]
    pub const fn from_quaternion(q: Quaternion) -> Self {
        Self::new(q.x, q.y, q.z, q.w)
    }
}

/// Linear velocity in world units per second.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Velocity {
    /// X velocity component.
    pub x: f64,
    /// Y velocity component.
    pub y: f64,
    /// Z velocity component.
    pub z: f64,
}

impl Component for Velocity {
    const NAME: &'static str = "Velocity";
}

impl Velocity {
    /// Velocity in units per second.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}
