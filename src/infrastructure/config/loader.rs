use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::{CallParams, Config};

/// Directory holding project-local configuration
pub const CONFIG_DIR: &str = ".erp-copilot";

/// Prefix of environment overrides; nested keys are split on `__`
pub const ENV_PREFIX: &str = "ERP_COPILOT_";

/// Configuration error types
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error("{0} cannot be empty")]
    EmptyValue(&'static str),

    #[error("Invalid cache lifetime: ttl_secs ({0}) must be greater than idle_secs ({1})")]
    InvalidCacheLifetime(u64, u64),

    #[error("Invalid {0}: must be at least 1")]
    ZeroCount(&'static str),

    #[error("Invalid temperature for {0}: {1}. Must be between 0 and 2")]
    InvalidTemperature(&'static str, f32),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .erp-copilot/config.yaml
    /// 3. .erp-copilot/local.yaml (optional overrides)
    /// 4. Environment variables (`ERP_COPILOT_*`, highest priority)
    pub fn load() -> Result<Config> {
        Self::load_in(Path::new("."))
    }

    /// Same as [`ConfigLoader::load`] with the config directory under `root`.
    pub fn load_in(root: &Path) -> Result<Config> {
        let config: Config = Self::figment(root)
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, with env overrides on top
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn figment(root: &Path) -> Figment {
        let dir = root.join(CONFIG_DIR);
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Yaml::file(dir.join("local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        let required = [
            ("completion.base_url", &config.completion.base_url),
            ("completion.model", &config.completion.model),
            ("embedding.base_url", &config.embedding.base_url),
            ("embedding.model", &config.embedding.model),
            ("search.endpoint", &config.search.endpoint),
            ("search.schema_index", &config.search.schema_index),
            ("search.support_index", &config.search.support_index),
            ("search.action_index", &config.search.action_index),
            ("billing.base_url", &config.billing.base_url),
        ];
        if let Some((name, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ConfigError::EmptyValue(name));
        }

        // Sliding renewal only makes sense inside the absolute lifetime
        if config.cache.ttl_secs <= config.cache.idle_secs {
            return Err(ConfigError::InvalidCacheLifetime(
                config.cache.ttl_secs,
                config.cache.idle_secs,
            ));
        }

        let counts = [
            ("retrieval.schema_top", config.retrieval.schema_top),
            ("retrieval.support_top", config.retrieval.support_top),
            ("retrieval.action_top", config.retrieval.action_top),
            ("retrieval.knn", config.retrieval.knn),
        ];
        if let Some((name, _)) = counts.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::ZeroCount(name));
        }

        let calls = [
            ("classifier", config.classifier.params()),
            ("generation.sql", config.generation.sql),
            ("generation.support", config.generation.support),
            ("generation.action", config.generation.action),
        ];
        for (name, CallParams { temperature, max_tokens }) in calls {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ConfigError::InvalidTemperature(name, temperature));
            }
            if max_tokens == 0 {
                return Err(ConfigError::ZeroCount(name));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.search.schema_index, "erp-schema");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
completion:
  base_url: https://contoso.openai.azure.com
  model: gpt-4o-mini
  api_version: 2024-02-01
cache:
  ttl_secs: 7200
  idle_secs: 600
  bill_cache_hits: true
erp:
  default_connection: Server=erp;Database=main
  connections:
    acme: Server=erp;Database=acme
logging:
  level: debug
  format: pretty
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.completion.model, "gpt-4o-mini");
        assert_eq!(config.completion.api_version.as_deref(), Some("2024-02-01"));
        assert_eq!(config.cache.ttl_secs, 7200);
        assert!(config.cache.bill_cache_hits);
        assert_eq!(config.erp.connection_for("acme"), "Server=erp;Database=acme");
        assert_eq!(config.embedding.model, "text-embedding-ada-002");

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogLevel("verbose".to_string()))
        );
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogFormat(_))
        ));
    }

    #[test]
    fn test_validate_empty_index() {
        let mut config = Config::default();
        config.search.action_index = " ".to_string();
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::EmptyValue("search.action_index"))
        );
    }

    #[test]
    fn test_validate_cache_lifetime() {
        let mut config = Config::default();
        config.cache.ttl_secs = 3_600;
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidCacheLifetime(3_600, 3_600))
        );
    }

    #[test]
    fn test_validate_zero_top_k() {
        let mut config = Config::default();
        config.retrieval.schema_top = 0;
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::ZeroCount("retrieval.schema_top"))
        );
    }

    #[test]
    fn test_validate_temperature_range() {
        let mut config = Config::default();
        config.generation.support.temperature = 2.5;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidTemperature("generation.support", _))
        ));
    }

    #[test]
    fn test_hierarchical_merging() {
        let root = tempfile::tempdir().expect("temp dir");
        let dir = root.path().join(CONFIG_DIR);
        fs::create_dir_all(&dir).expect("config dir");
        fs::write(
            dir.join("config.yaml"),
            "search:\n  endpoint: https://search.example.net\n  schema_index: base-schema\nlogging:\n  level: info\n  format: pretty\n",
        )
        .expect("write base");
        fs::write(dir.join("local.yaml"), "search:\n  schema_index: local-schema\n")
            .expect("write local");

        let config = temp_env::with_vars(
            [
                ("ERP_COPILOT_LOGGING__LEVEL", Some("debug")),
                ("ERP_COPILOT_CACHE__BILL_CACHE_HITS", Some("true")),
            ],
            || ConfigLoader::load_in(root.path()),
        )
        .expect("config should load");

        assert_eq!(config.search.endpoint, "https://search.example.net");
        assert_eq!(config.search.schema_index, "local-schema", "local.yaml should win");
        assert_eq!(config.logging.level, "debug", "env should win");
        assert_eq!(config.logging.format, "pretty", "base value should persist");
        assert!(config.cache.bill_cache_hits);
    }

    #[test]
    fn test_invalid_env_value_rejected() {
        let root = tempfile::tempdir().expect("temp dir");
        let result = temp_env::with_var("ERP_COPILOT_RETRIEVAL__KNN", Some("0"), || {
            ConfigLoader::load_in(root.path())
        });
        assert!(result.is_err());
    }
}
