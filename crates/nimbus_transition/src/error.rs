//! # Transition Error Types

use nimbus_core::EcsError;
use thiserror::Error;

/// Errors raised by the transition engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// No registered transitionable type accepts the value.
    #[error("no transitionable type matches the target value")]
    UnresolvedType,

    /// An explicit type name is not registered.
    #[error("unknown transitionable type: {0}")]
    UnknownTransitionableType(String),

    /// The value is not of the requested type.
    #[error("value is not a {type_name}")]
    TypeMismatch {
        /// Name of the requested type.
        type_name: String,
    },

    /// The easing path does not name a catalog entry.
    #[error("unknown easing: {0}")]
    UnknownEasing(String),

    /// A stored transition record could not be decoded.
    #[error("corrupt transition record: {0}")]
    CorruptRecord(String),

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Component store failure.
    #[error(transparent)]
    Ecs(#[from] EcsError),
}

/// Result type for transition operations.
pub type TransitionResult<T> = Result<T, TransitionError>;
