//! # ECS Error Types
//!
//! All errors that can occur in the component store and the schema engine.

use thiserror::Error;

use crate::ecs::EntityId;

/// Errors that can occur in the component store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// The caller passed the null entity.
    #[error("entity is unspecified")]
    UnspecifiedEntity,

    /// The entity was never spawned or has been despawned.
    #[error("entity {entity} does not exist")]
    EntityNotFound {
        /// The missing entity.
        entity: EntityId,
    },

    /// A non-optional operation referenced a component that is not attached.
    #[error("component {component} is not attached to entity {entity}")]
    ComponentNotFound {
        /// The entity that was queried.
        entity: EntityId,
        /// Name of the missing component.
        component: String,
    },

    /// A component name or json id is not registered.
    #[error("component {0} is not registered")]
    UnknownComponent(String),

    /// A component name or json id was registered twice.
    #[error("component {0} is already registered")]
    DuplicateComponent(String),

    /// Required-field validation failed.
    #[error("missing required value for key {key}")]
    MissingRequiredValue {
        /// Key segment where the check failed.
        key: String,
    },

    /// A schema validator rejected the incoming value.
    #[error("invalid value for key {key}")]
    InvalidValue {
        /// Key segment where the check failed.
        key: String,
    },

    /// The component was registered in a different registry epoch than the
    /// world was built in; worlds must be rebuilt after a registry reset.
    #[error("component {0} belongs to a different registry epoch than this world")]
    StaleComponent(String),

    /// A user lifecycle hook failed.
    #[error("component {component} hook failed: {reason}")]
    HookFailed {
        /// Component whose hook failed.
        component: String,
        /// Hook-provided reason.
        reason: String,
    },
}

/// Result type for ECS operations.
pub type EcsResult<T> = Result<T, EcsError>;
