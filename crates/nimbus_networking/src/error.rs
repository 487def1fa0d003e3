//! # Networking Error Types

use nimbus_core::EcsError;
use thiserror::Error;

/// Errors raised while encoding or decoding packets.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// A read or write ran past the end of the buffer.
    #[error("cursor out of bounds: needed {needed} bytes, {remaining} remaining")]
    OutOfBounds {
        /// Bytes the operation needed.
        needed: usize,
        /// Bytes left in the buffer.
        remaining: usize,
    },

    /// More network schemas were registered than a change mask can address.
    #[error("at most {limit} network schemas can be registered")]
    TooManySchemas {
        /// Mask width in bits.
        limit: usize,
    },

    /// A change mask has a bit set that no writer could have produced.
    #[error("change mask bit {0} has no matching writer")]
    UnexpectedMaskBit(u8),

    /// No network object has this id.
    #[error("unknown network object {0}")]
    UnknownNetworkObject(u32),

    /// A network id is already in use.
    #[error("network object {0} already exists")]
    DuplicateNetworkObject(u32),

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Component store failure.
    #[error(transparent)]
    Ecs(#[from] EcsError),
}

/// Result type for networking operations.
pub type NetworkResult<T> = Result<T, NetworkError>;
