//! Speaker Manager Configuration

use serde::{Deserialize, Serialize};

use crate::speaker::{VOLUME_MAX, VOLUME_MIN};

/// Configuration for the speaker manager
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Volume restored when unmuting a group that sits at zero
    pub min_unmute_volume: u8,
    /// Mirror each consistent group into the context store when the worker starts
    pub publish_initial_state: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_unmute_volume: 10,
            publish_initial_state: true,
        }
    }
}

impl EngineConfig {
    pub fn with_min_unmute_volume(mut self, volume: u8) -> Self {
        self.min_unmute_volume = volume;
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        // Zero would leave an unmuted group silent.
        if self.min_unmute_volume <= VOLUME_MIN || self.min_unmute_volume > VOLUME_MAX {
            errors.push(format!(
                "min_unmute_volume must be between {} and {}, got {}",
                VOLUME_MIN + 1,
                VOLUME_MAX,
                self.min_unmute_volume
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
