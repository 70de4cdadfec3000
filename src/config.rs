//! CLI configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via SPROC_CONFIG or --config)
//! 3. Environment variables

use serde::{Deserialize, Serialize};
use sproc_codec::{ArmorMode, CodecConfig};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "SPROC_CONFIG";

/// Tool configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Codec options.
    pub codec: CodecConfig,
    /// Logging options.
    pub log: LogConfig,
}

impl Config {
    /// Loads configuration from `path` (or `SPROC_CONFIG`), then applies
    /// environment variable overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e.to_string()))
    }

    /// Applies overrides read through `lookup`, normally the process
    /// environment.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mode) = lookup("SPROC_ARMOR_MODE") {
            self.codec.armor_mode = mode
                .parse::<ArmorMode>()
                .map_err(|e| ConfigError::Invalid(format!("SPROC_ARMOR_MODE: {}", e)))?;
        }

        if let Some(depth) = lookup("SPROC_MAX_DEPTH") {
            self.codec.max_depth = depth
                .parse()
                .map_err(|e| ConfigError::Invalid(format!("SPROC_MAX_DEPTH: {}", e)))?;
        }

        if let Some(capacity) = lookup("SPROC_INITIAL_CAPACITY") {
            self.codec.initial_capacity = capacity
                .parse()
                .map_err(|e| ConfigError::Invalid(format!("SPROC_INITIAL_CAPACITY: {}", e)))?;
        }

        if let Some(level) = lookup("SPROC_LOG_LEVEL") {
            if !level.is_empty() {
                self.log.level = level;
            }
        }

        Ok(())
    }

    /// Rejects settings the codec cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.codec.max_depth == 0 {
            return Err(ConfigError::Invalid(
                "codec.max_depth must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Serializes the configuration as YAML.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter when RUST_LOG is unset.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {1}", .0.display())]
    Io(PathBuf, std::io::Error),

    #[error("failed to parse config file '{}': {1}", .0.display())]
    Parse(PathBuf, String),

    #[error("configuration validation failed: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.codec, CodecConfig::default());
        assert_eq!(config.log.level, "warn");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = Config {
            codec: CodecConfig::default().strict().with_max_depth(64),
            log: LogConfig {
                level: "debug".into(),
            },
        };
        let yaml = config.to_yaml().unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "codec:\n  armor_mode: strict\n  max_depth: 32").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.codec.armor_mode, ArmorMode::Strict);
        assert_eq!(config.codec.max_depth, 32);
        assert_eq!(config.codec.initial_capacity, CodecConfig::default().initial_capacity);
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn test_from_missing_file() {
        let err = Config::from_file("/nonexistent/sproc.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(..)));
        assert!(err.to_string().contains("/nonexistent/sproc.yaml"));
    }

    #[test]
    fn test_from_bad_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "codec: [not, a, map]").unwrap();
        assert!(matches!(
            Config::from_file(file.path()),
            Err(ConfigError::Parse(..))
        ));
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(env(&[
                ("SPROC_ARMOR_MODE", "strict"),
                ("SPROC_MAX_DEPTH", "10"),
                ("SPROC_INITIAL_CAPACITY", "64"),
                ("SPROC_LOG_LEVEL", "trace"),
            ]))
            .unwrap();

        assert_eq!(config.codec.armor_mode, ArmorMode::Strict);
        assert_eq!(config.codec.max_depth, 10);
        assert_eq!(config.codec.initial_capacity, 64);
        assert_eq!(config.log.level, "trace");
    }

    #[test]
    fn test_bad_overrides() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(env(&[("SPROC_MAX_DEPTH", "deep")]))
            .unwrap_err();
        assert!(err.to_string().contains("SPROC_MAX_DEPTH"));

        let err = config
            .apply_overrides(env(&[("SPROC_ARMOR_MODE", "loose")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_validate_depth() {
        let mut config = Config::default();
        config.codec.max_depth = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
