//! Engine configuration.

use crate::snap::DEFAULT_SNAP_THRESHOLD;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// What happens to the edge being replaced when a reconnection drag ends
/// without a new target (cancel or drop back onto the source).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconnectPolicy {
    /// The original edge stays deleted.
    #[default]
    Discard,
    /// The original edge is re-added with its control points.
    Restore,
}

/// Tunables for the connection engine and gesture router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Magnetic snap distance in screen units.
    pub snap_threshold: f64,
    /// Fate of the replaced edge on an aborted reconnection.
    pub reconnect_policy: ReconnectPolicy,
    /// Maximum delay between two presses of a double click.
    pub double_click_ms: u64,
    /// Maximum pointer travel between two presses of a double click.
    pub double_click_distance: f64,
    /// Distance within which a press hits a connection's route.
    pub hit_tolerance: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            snap_threshold: DEFAULT_SNAP_THRESHOLD,
            reconnect_policy: ReconnectPolicy::default(),
            double_click_ms: 500,
            double_click_distance: 5.0,
            hit_tolerance: 6.0,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Check that distances are finite and non-negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("snap_threshold", self.snap_threshold),
            ("double_click_distance", self.double_click_distance),
            ("hit_tolerance", self.hit_tolerance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}
