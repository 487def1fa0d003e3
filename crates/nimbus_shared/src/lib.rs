//! # NIMBUS Shared
//!
//! Value types used by every other crate in the workspace.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on the ECS, the transition engine or the
//! codec. It only knows numbers.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]

pub mod color;
pub mod math;

pub use color::{Color, Hsl};
pub use math::{lerp, Quaternion, Vec2, Vec3};
