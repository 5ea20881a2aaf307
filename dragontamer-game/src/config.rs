//! Host-facing engine configuration.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{DEFAULT_SAVE_KEY, DEFAULT_TICK_INTERVAL_SECS};

/// Errors raised when engine configuration invariants are violated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("save key must not be empty")]
    EmptySaveKey,
    #[error("tick interval must be at least one second (got {0})")]
    TickInterval(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Storage slot the engine reads on open and overwrites after every mutation.
    #[serde(default = "EngineConfig::default_save_key")]
    pub save_key: String,
    /// Cadence at which the host should call `tick()`.
    #[serde(default = "EngineConfig::default_tick_interval_secs")]
    pub tick_interval_secs: u64,
    /// Reject feed requests until the feeding upgrade is owned.
    #[serde(default = "EngineConfig::default_require_feed_unlock")]
    pub require_feed_unlock: bool,
}

impl EngineConfig {
    fn default_save_key() -> String {
        DEFAULT_SAVE_KEY.to_string()
    }

    const fn default_tick_interval_secs() -> u64 {
        DEFAULT_TICK_INTERVAL_SECS
    }

    const fn default_require_feed_unlock() -> bool {
        true
    }

    /// Parse configuration from JSON, filling omitted fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.save_key.trim().is_empty() {
            return Err(ConfigError::EmptySaveKey);
        }
        if self.tick_interval_secs == 0 {
            return Err(ConfigError::TickInterval(self.tick_interval_secs));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            save_key: Self::default_save_key(),
            tick_interval_secs: Self::default_tick_interval_secs(),
            require_feed_unlock: Self::default_require_feed_unlock(),
        }
    }
}
