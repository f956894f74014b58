//! Harness configuration
//!
//! Loaded from a JSON file. Every field is optional; missing fields take the
//! defaults below.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use stampede_core::Amount;

use crate::error::ConfigError;

/// Allowance granted to the router for each token, 10^24
pub const DEFAULT_ALLOWANCE: Amount = 1_000_000_000_000_000_000_000_000;

/// Settings of the agent pool and its traffic controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Number of trading identities
    #[serde(default = "default_agents")]
    pub agents: usize,

    /// Base phrase; agent `i` signs as `{phrase}//{i}`
    #[serde(default = "default_phrase")]
    pub phrase: String,

    /// Approve the router for every token before reporting ready
    #[serde(default = "default_set_allowance")]
    pub set_allowance: bool,

    #[serde(default = "default_allowance")]
    pub allowance: Amount,

    /// Smallest balance a token must hold to start a trade from it
    #[serde(default = "default_minimal_balance")]
    pub minimal_balance: Amount,

    /// Traffic controller tick
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Node endpoints, handed out round-robin by agent index
    #[serde(default)]
    pub endpoints: Vec<String>,

    /// Base RNG seed; agent `i` uses `seed + i`. Entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_agents() -> usize {
    4
}

fn default_phrase() -> String {
    "//Stampede".to_string()
}

fn default_set_allowance() -> bool {
    true
}

fn default_allowance() -> Amount {
    DEFAULT_ALLOWANCE
}

fn default_minimal_balance() -> Amount {
    1_000_000
}

fn default_tick_interval_ms() -> u64 {
    1000
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            agents: default_agents(),
            phrase: default_phrase(),
            set_allowance: default_set_allowance(),
            allowance: default_allowance(),
            minimal_balance: default_minimal_balance(),
            tick_interval_ms: default_tick_interval_ms(),
            endpoints: Vec::new(),
            seed: None,
        }
    }
}

impl HarnessConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::from_json(&content)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agents == 0 {
            return Err(ConfigError::Invalid("agents must be positive".into()));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "tick_interval_ms must be positive".into(),
            ));
        }
        // agents append their own derivation path
        if self.phrase.trim_start_matches("//").contains("//") {
            return Err(ConfigError::Invalid(format!(
                "phrase '{}' must not carry a derivation path",
                self.phrase
            )));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Endpoint assigned to agent `index`, if any are configured
    pub fn endpoint_for(&self, index: usize) -> Option<String> {
        if self.endpoints.is_empty() {
            None
        } else {
            Some(self.endpoints[index % self.endpoints.len()].clone())
        }
    }

    /// RNG seed for agent `index`
    pub fn seed_for(&self, index: usize) -> Option<u64> {
        self.seed.map(|s| s.wrapping_add(index as u64))
    }
}
