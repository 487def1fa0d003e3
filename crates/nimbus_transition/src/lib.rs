//! # NIMBUS Transition
//!
//! Time-based interpolation of component properties addressed by dotted
//! path. The owning component never knows it is being tweened: transitions
//! live in a separate Transition Record component and write their output
//! back into the target property each tick.
//!
//! ## Example
//!
//! ```rust,ignore
//! use nimbus_transition::{TransitionConfig, TransitionEngine, TransitionSystem, TransitionTarget};
//!
//! let system = TransitionSystem::new(TransitionEngine::new(&registry, TransitionConfig::default())?);
//! system.engine().set_target(
//!     &mut world,
//!     entity,
//!     TransitionTarget::new("light", "intensity", json!(10.0))
//!         .with_duration(1000.0)
//!         .with_easing("quadratic.inOut"),
//! )?;
//!
//! // Every tick
//! system.execute(&mut world, 16.0);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod easing;
pub mod engine;
pub mod error;
pub mod record;
pub mod system;
pub mod transitionable;

pub use config::TransitionConfig;
pub use easing::{Easing, EasingFamily, EasingFlavor};
pub use engine::{TransitionEngine, TransitionTarget};
pub use error::{TransitionError, TransitionResult};
pub use record::{TransitionEntry, TransitionEvent, TRANSITION_JSON_ID};
pub use system::TransitionSystem;
pub use transitionable::{Transitionable, TransitionableRegistry};
