//! # Replication Configuration
//!
//! ```toml
//! resync_interval_ticks = 60
//! max_packet_size = 1200
//! position_range = 1024.0
//! compress_transforms = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::codec::packet::HEADER_SIZE;
use crate::error::{NetworkError, NetworkResult};

/// Replication tuning shared by writers and readers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplicationConfig {
    /// Entities tagged for periodic updates resend every field on ticks
    /// divisible by this.
    pub resync_interval_ticks: u64,
    /// Upper bound on an encoded packet, in bytes.
    pub max_packet_size: usize,
    /// Compressed positions are quantized over `[-range, range]` per axis.
    pub position_range: f64,
    /// Register the compressed transform schema instead of the f64 one.
    pub compress_transforms: bool,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            resync_interval_ticks: 60,
            // Safe across all networks (< 1500 MTU)
            max_packet_size: 1200,
            position_range: 1024.0,
            compress_transforms: false,
        }
    }
}

impl ReplicationConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`NetworkError::InvalidConfig`] for malformed TOML or out-of-range values.
    pub fn from_toml_str(source: &str) -> NetworkResult<Self> {
        let config: Self = toml::from_str(source)
            .map_err(|e| NetworkError::InvalidConfig(format!("failed to parse replication config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// As [`ReplicationConfig::from_toml_str`], plus unreadable files.
    pub fn from_toml_file(path: impl AsRef<Path>) -> NetworkResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| NetworkError::InvalidConfig(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    /// Checks every field.
    ///
    /// # Errors
    ///
    /// [`NetworkError::InvalidConfig`].
    pub fn validate(&self) -> NetworkResult<()> {
        if self.resync_interval_ticks == 0 {
            return Err(NetworkError::InvalidConfig(
                "resync_interval_ticks must be at least 1".to_string(),
            ));
        }
        if self.max_packet_size < HEADER_SIZE {
            return Err(NetworkError::InvalidConfig(format!(
                "max_packet_size must hold the {HEADER_SIZE}-byte header, got {}",
                self.max_packet_size
            )));
        }
        if !self.position_range.is_finite() || self.position_range <= 0.0 {
            return Err(NetworkError::InvalidConfig(format!(
                "position_range must be positive, got {}",
                self.position_range
            )));
        }
        Ok(())
    }

    /// Whether a tagged entity resends everything on `tick`.
    #[inline]
    #[must_use]
    pub fn is_resync_tick(&self, tick: u64, override_interval: u32) -> bool {
        let interval = if override_interval == 0 {
            self.resync_interval_ticks
        } else {
            u64::from(override_interval)
        };
        tick % interval == 0
    }
}
