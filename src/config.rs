//! Registry configuration.
//!
//! Parsed from JSON so hosts can pass it through an environment variable
//! rather than a struct across the boundary.

use crate::error::Result;
use crate::handle::IdStrategy;
use serde::{Deserialize, Serialize};

/// Environment variable holding a JSON-encoded [`RegistryConfig`].
pub const CONFIG_ENV_VAR: &str = "SYSTRAY_REGISTRY_CONFIG";

/// Registry construction options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// How fresh handle ids are drawn
    pub id_strategy: IdStrategy,
    /// Pre-allocated table capacity
    pub initial_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            id_strategy: IdStrategy::Random,
            initial_capacity: 16,
        }
    }
}

impl RegistryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id_strategy(mut self, strategy: IdStrategy) -> Self {
        self.id_strategy = strategy;
        self
    }

    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read the config from [`CONFIG_ENV_VAR`], or defaults when unset.
    pub fn from_env() -> Result<Self> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(json) if !json.trim().is_empty() => Self::from_json(&json),
            _ => Ok(Self::default()),
        }
    }
}
