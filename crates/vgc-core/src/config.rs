//! Configuration for the VGC engines
//!
//! Configuration is organized into logical sections:
//! - History settings (undo retention)
//! - Complex settings (persistent diff recording)
//!
//! Every section has defaults, so an empty TOML document is a valid
//! configuration.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Undo history settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of undo levels kept on the main branch
    pub max_levels: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_levels: 100 }
    }
}

/// Complex settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplexConfig {
    /// Accumulate a persistent diff across transactions for external consumers
    pub diff_enabled: bool,
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VgcConfig {
    pub history: HistoryConfig,
    pub complex: ComplexConfig,
}

impl VgcConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: VgcConfig =
            toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history.max_levels == 0 {
            return Err(ConfigError::ValueOutOfRange {
                key: "history.max_levels".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}
