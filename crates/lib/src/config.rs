//! Runtime configuration of a node container.

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::constants::{DEFAULT_HISTORY_CAPACITY, DEFAULT_SWEEP_THRESHOLD};

/// Tuning knobs of a [`NodeContainer`](crate::NodeContainer) and the undo
/// history recording it.
///
/// Missing fields take their defaults, so partial JSON documents are valid:
///
/// ```
/// # use quantum::ContainerConfig;
/// let config = ContainerConfig::from_json(r#"{ "sweep_threshold": 0 }"#).unwrap();
/// assert_eq!(config.sweep_threshold, 0);
/// assert_eq!(config.history_capacity, ContainerConfig::default().history_capacity);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerConfig {
    /// Node registrations between automatic garbage sweeps; 0 disables them
    #[serde(default = "default_sweep_threshold")]
    pub sweep_threshold: usize,

    /// Maximum number of operations kept by an undo recorder
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

fn default_sweep_threshold() -> usize {
    DEFAULT_SWEEP_THRESHOLD
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            sweep_threshold: DEFAULT_SWEEP_THRESHOLD,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl ContainerConfig {
    /// Parses a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the configuration to JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
