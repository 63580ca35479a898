//! Engine configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) yields the
//! stock dual-direction thresholds.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {field} {problem}")]
    Invalid {
        field: &'static str,
        problem: &'static str,
    },
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub dual_direction: DualDirectionConfig,
}

/// Thresholds and sizing for the dual-direction strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DualDirectionConfig {
    /// Leverage applied when neither the leg nor the request supplies one.
    pub default_leverage: f64,
    /// Leverage-adjusted profit (percentage points) at which a leg is closed.
    pub close_threshold_pct: f64,
    /// Profitable cycles on one leg that earn one add on the other.
    pub add_profit_cycles: u32,
    /// Seconds after a close during which the missing leg is not reopened.
    pub cooldown_secs: u64,
    /// Margin (quote currency) for opening a leg.
    pub open_margin: f64,
    /// Margin (quote currency) for an add.
    pub add_margin: f64,
}

impl Default for DualDirectionConfig {
    fn default() -> Self {
        Self {
            default_leverage: 50.0,
            close_threshold_pct: 50.0,
            add_profit_cycles: 4,
            cooldown_secs: 60,
            open_margin: 1.0,
            add_margin: 0.5,
        }
    }
}

impl EngineConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.dual_direction.validate()
    }

    /// Render as TOML (used by `hedgelab config`).
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

impl DualDirectionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.default_leverage) {
            return Err(ConfigError::Invalid {
                field: "default_leverage",
                problem: "must be positive",
            });
        }
        if !positive(self.close_threshold_pct) {
            return Err(ConfigError::Invalid {
                field: "close_threshold_pct",
                problem: "must be positive",
            });
        }
        if self.add_profit_cycles == 0 {
            return Err(ConfigError::Invalid {
                field: "add_profit_cycles",
                problem: "must be at least 1",
            });
        }
        if !positive(self.open_margin) {
            return Err(ConfigError::Invalid {
                field: "open_margin",
                problem: "must be positive",
            });
        }
        if !positive(self.add_margin) {
            return Err(ConfigError::Invalid {
                field: "add_margin",
                problem: "must be positive",
            });
        }
        Ok(())
    }
}
