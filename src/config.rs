// Copyright (c) 2025 - Cowboy AI, Inc.
//! Engine configuration
//!
//! Defaults suit an interactive operator session. Every field can be
//! overridden from the environment with [`EngineConfig::from_env`].

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::errors::{NetConfigError, NetConfigResult};

/// Environment variable for [`EngineConfig::max_history`]
pub const ENV_MAX_HISTORY: &str = "NETCONFIG_MAX_HISTORY";
/// Environment variable for [`EngineConfig::validation_timeout_ms`]
pub const ENV_VALIDATION_TIMEOUT_MS: &str = "NETCONFIG_VALIDATION_TIMEOUT_MS";
/// Environment variable for [`EngineConfig::initial_snapshot`]
pub const ENV_INITIAL_SNAPSHOT: &str = "NETCONFIG_INITIAL_SNAPSHOT";

/// Configuration store and transaction settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Snapshots kept per device before the oldest is evicted (default: 50)
    pub max_history: usize,

    /// Deadline for post-mutation business validation (default: 5s)
    pub validation_timeout_ms: u64,

    /// Record an "Initial configuration" snapshot when a device registers
    pub initial_snapshot: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_history: 50,
            validation_timeout_ms: 5_000,
            initial_snapshot: true,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> NetConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Overlay values from `lookup` on the defaults
    pub fn from_lookup<F>(lookup: F) -> NetConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_MAX_HISTORY) {
            config.max_history = parse_var(ENV_MAX_HISTORY, &value)?;
        }
        if let Some(value) = lookup(ENV_VALIDATION_TIMEOUT_MS) {
            config.validation_timeout_ms = parse_var(ENV_VALIDATION_TIMEOUT_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_INITIAL_SNAPSHOT) {
            config.initial_snapshot = parse_var(ENV_INITIAL_SNAPSHOT, &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_max_history(mut self, max_history: usize) -> Self {
        self.max_history = max_history;
        self
    }

    pub fn with_validation_timeout(mut self, timeout: Duration) -> Self {
        self.validation_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_initial_snapshot(mut self, enabled: bool) -> Self {
        self.initial_snapshot = enabled;
        self
    }

    pub fn validation_timeout(&self) -> Duration {
        Duration::from_millis(self.validation_timeout_ms)
    }

    /// Reject settings the store cannot run with
    pub fn validate(&self) -> NetConfigResult<()> {
        if self.max_history == 0 {
            return Err(NetConfigError::Configuration(
                "max_history must be at least 1".to_string(),
            ));
        }
        if self.validation_timeout_ms == 0 {
            return Err(NetConfigError::Configuration(
                "validation_timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> NetConfigResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| NetConfigError::Configuration(format!("{key} has invalid value: {value}")))
}
