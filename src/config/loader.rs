//! Configuration Loader
//!
//! Layers an optional TOML file under `COMMAND__*` environment variables
//! using the `config` crate, then validates the result.
//!
//! Environment keys use `__` as the nesting separator:
//!
//! ```text
//! COMMAND__REQUEST_CACHE_ENABLED=false
//! COMMAND__COMMANDS__GETUSER__FALLBACK_ENABLED=false
//! ```

use super::error::{ConfigResult, ConfigurationError};
use super::EngineConfig;
use config::{Config, Environment, File, FileFormat};
use std::path::Path;
use tracing::debug;

const ENV_PREFIX: &str = "COMMAND";
const ENV_SEPARATOR: &str = "__";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from an optional TOML file with environment overrides
    pub fn load(path: Option<&Path>) -> ConfigResult<EngineConfig> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigurationError::ConfigFileNotFound {
                    path: path.to_path_buf(),
                });
            }
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }

        let config: EngineConfig = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Self::finish(config, path.map(|p| p.display().to_string()))
    }

    /// Load from TOML text only, ignoring the process environment
    pub fn from_toml_str(contents: &str) -> ConfigResult<EngineConfig> {
        let config: EngineConfig = Config::builder()
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        Self::finish(config, None)
    }

    fn finish(mut config: EngineConfig, source: Option<String>) -> ConfigResult<EngineConfig> {
        config.normalize_command_keys();
        config.validate()?;

        debug!(
            source = source.as_deref().unwrap_or("<inline>"),
            environment = %config.environment,
            request_cache_enabled = config.request_cache_enabled,
            fallback_enabled = config.fallback_enabled,
            command_overrides = config.commands.len(),
            "Engine configuration loaded"
        );

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_toml_str() {
        let config = ConfigLoader::from_toml_str(
            r#"
            environment = "test"
            request_cache_enabled = false
            log_events = true

            [commands.GetUser]
            request_cache_enabled = true
            fallback_enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.environment, "test");
        assert!(!config.request_cache_enabled);
        assert!(config.fallback_enabled);
        assert!(config.log_events);

        let settings = config.settings_for("GetUser");
        assert!(settings.request_cache_enabled);
        assert!(!settings.fallback_enabled);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = ConfigLoader::from_toml_str("").unwrap();
        assert!(config.request_cache_enabled);
        assert!(config.fallback_enabled);
    }

    #[test]
    fn test_invalid_toml_is_load_error() {
        let result = ConfigLoader::from_toml_str("request_cache_enabled = = true");
        assert!(matches!(result, Err(ConfigurationError::LoadError { .. })));
    }

    #[test]
    fn test_validation_runs_after_load() {
        let result = ConfigLoader::from_toml_str(r#"environment = """#);
        assert!(matches!(result, Err(ConfigurationError::InvalidValue { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "environment = \"staging\"\nfallback_enabled = false").unwrap();

        let config = ConfigLoader::load(Some(file.path())).unwrap();
        assert_eq!(config.environment, "staging");
        assert!(!config.fallback_enabled);
    }

    #[test]
    fn test_per_command_override_from_environment() {
        let var = "COMMAND__COMMANDS__ENVONLYLOOKUP__FALLBACK_ENABLED";
        std::env::set_var(var, "false");
        let result = ConfigLoader::load(None);
        std::env::remove_var(var);

        let config = result.unwrap();
        assert!(config.commands.contains_key("envonlylookup"));
        assert!(!config.settings_for("EnvOnlyLookup").fallback_enabled);
        assert!(config.settings_for("EnvOnlyLookup").request_cache_enabled);
        assert!(config.settings_for("SomethingElse").fallback_enabled);
    }

    #[test]
    fn test_file_override_with_mixed_case_key() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[commands.UsingRequestCache]\nrequest_cache_enabled = false").unwrap();

        let config = ConfigLoader::load(Some(file.path())).unwrap();
        assert!(!config.settings_for("UsingRequestCache").request_cache_enabled);
        assert!(config.settings_for("UsingRequestCache").fallback_enabled);
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigLoader::load(Some(Path::new("/definitely/not/here.toml")));
        assert!(matches!(
            result,
            Err(ConfigurationError::ConfigFileNotFound { .. })
        ));
    }
}
