//! # Transition Configuration
//!
//! Defaults applied to new transition entries, loaded from TOML:
//!
//! ```toml
//! default_duration_ms = 250.0
//! default_easing = "quadratic.inOut"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::easing::Easing;
use crate::error::{TransitionError, TransitionResult};

/// Defaults for [`set_target`](crate::TransitionEngine::set_target) calls
/// that omit duration or easing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    /// Duration in milliseconds.
    pub default_duration_ms: f64,
    /// Easing path (`"family.flavor"`).
    pub default_easing: String,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            default_duration_ms: 500.0,
            default_easing: Easing::LINEAR.to_string(),
        }
    }
}

impl TransitionConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`TransitionError::InvalidConfig`] for malformed TOML or a negative
    /// duration; [`TransitionError::UnknownEasing`] for a bad easing path.
    pub fn from_toml_str(source: &str) -> TransitionResult<Self> {
        let config: Self = toml::from_str(source)
            .map_err(|e| TransitionError::InvalidConfig(format!("failed to parse transition config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// As [`TransitionConfig::from_toml_str`], plus unreadable files.
    pub fn from_toml_file(path: impl AsRef<Path>) -> TransitionResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            TransitionError::InvalidConfig(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&source)
    }

    /// Checks the duration and easing.
    ///
    /// # Errors
    ///
    /// See [`TransitionConfig::from_toml_str`].
    pub fn validate(&self) -> TransitionResult<()> {
        if !self.default_duration_ms.is_finite() || self.default_duration_ms < 0.0 {
            return Err(TransitionError::InvalidConfig(format!(
                "default_duration_ms must be a non-negative number, got {}",
                self.default_duration_ms
            )));
        }
        self.easing().map(|_| ())
    }

    /// The default easing.
    ///
    /// # Errors
    ///
    /// [`TransitionError::UnknownEasing`].
    pub fn easing(&self) -> TransitionResult<Easing> {
        Easing::parse(&self.default_easing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TransitionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.easing().unwrap(), Easing::LINEAR);
    }

    #[test]
    fn test_parse_partial_document() {
        let config = TransitionConfig::from_toml_str("default_easing = \"sine.out\"").unwrap();
        assert_eq!(config.default_easing, "sine.out");
        assert!((config.default_duration_ms - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(matches!(
            TransitionConfig::from_toml_str("default_duration_ms = -1.0"),
            Err(TransitionError::InvalidConfig(_))
        ));
        assert!(matches!(
            TransitionConfig::from_toml_str("default_easing = \"nope.in\""),
            Err(TransitionError::UnknownEasing(_))
        ));
        assert!(matches!(
            TransitionConfig::from_toml_str("default_duration_ms = \"fast\""),
            Err(TransitionError::InvalidConfig(_))
        ));
    }
}
