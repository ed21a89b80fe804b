//! # Engine Configuration
//!
//! Switches that shape how the engine treats caching and fallbacks, globally
//! and per command key.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use command_core::config::ConfigLoader;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // TOML file plus COMMAND__* environment overrides
//! let config = ConfigLoader::load(Some(Path::new("config/commands.toml")))?;
//! let settings = config.settings_for("GetUser");
//! println!("cache enabled: {}", settings.request_cache_enabled);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigLoader;

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub environment: String,

    /// Global switch for request-scoped caching
    pub request_cache_enabled: bool,

    /// Global switch for fallbacks; when off, a primary failure is terminal
    pub fallback_enabled: bool,

    /// Log every execution event as a structured line
    pub log_events: bool,

    /// Per-command-key overrides
    pub commands: HashMap<String, CommandSettings>,
}

/// Overrides for one command key; unset fields inherit the global value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandSettings {
    pub request_cache_enabled: Option<bool>,
    pub fallback_enabled: Option<bool>,
}

/// Effective settings for one command key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSettings {
    pub request_cache_enabled: bool,
    pub fallback_enabled: bool,
}

impl EngineConfig {
    /// Resolve the effective settings for a command key.
    ///
    /// Keys match case-insensitively: the `config` crate lowercases table and
    /// environment keys, so `[commands.GetUser]` arrives as `getuser`.
    pub fn settings_for(&self, command_key: &str) -> ResolvedSettings {
        let overrides = self.commands.get(command_key).or_else(|| {
            self.commands
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(command_key))
                .map(|(_, settings)| settings)
        });
        ResolvedSettings {
            request_cache_enabled: overrides
                .and_then(|s| s.request_cache_enabled)
                .unwrap_or(self.request_cache_enabled),
            fallback_enabled: overrides
                .and_then(|s| s.fallback_enabled)
                .unwrap_or(self.fallback_enabled),
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.environment.trim().is_empty() {
            return Err(ConfigurationError::invalid_value(
                "environment",
                &self.environment,
                "environment name must not be empty",
            ));
        }

        if let Some(key) = self.commands.keys().find(|key| key.trim().is_empty()) {
            return Err(ConfigurationError::invalid_value(
                "commands",
                key,
                "command keys must not be empty",
            ));
        }

        Ok(())
    }

    /// Lowercase every per-command key so file and environment sources merge
    pub fn normalize_command_keys(&mut self) {
        self.commands = std::mem::take(&mut self.commands)
            .into_iter()
            .map(|(key, settings)| (key.to_lowercase(), settings))
            .collect();
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            environment: detect_environment(),
            request_cache_enabled: true,
            fallback_enabled: true,
            log_events: false,
            commands: HashMap::new(),
        }
    }
}

/// Get current environment from environment variables
pub fn detect_environment() -> String {
    std::env::var("COMMAND_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}
