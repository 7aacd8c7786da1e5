#![deny(unsafe_code)]

//! Configuration loading and validation for toolreg.
//!
//! Loads `toolreg.toml` and validates it. [`AppConfig`] is the central
//! configuration structure; every section is optional and falls back to the
//! conventional repository layout (`registry.json`, `bundles/rules/`,
//! `bundles/`, `dist/`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Top-level application configuration.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Locations of the registry, rule sets, and generated artifacts.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Query command defaults.
    #[serde(default)]
    pub query: QueryConfig,
}

/// File-system layout of a registry checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// The source-of-truth registry document.
    #[serde(default = "default_registry_path")]
    pub registry: PathBuf,

    /// Directory holding `*.rules.json` rule-set documents.
    #[serde(default = "default_rules_dir")]
    pub rules_dir: PathBuf,

    /// Directory generated bundle files are written to and read from.
    #[serde(default = "default_bundles_dir")]
    pub bundles_dir: PathBuf,

    /// Directory for derived artifacts (index, capabilities, meta).
    #[serde(default = "default_dist_dir")]
    pub dist_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            registry: default_registry_path(),
            rules_dir: default_rules_dir(),
            bundles_dir: default_bundles_dir(),
            dist_dir: default_dist_dir(),
        }
    }
}

fn default_registry_path() -> PathBuf {
    PathBuf::from("registry.json")
}

fn default_rules_dir() -> PathBuf {
    PathBuf::from("bundles/rules")
}

fn default_bundles_dir() -> PathBuf {
    PathBuf::from("bundles")
}

fn default_dist_dir() -> PathBuf {
    PathBuf::from("dist")
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "debug", "trace").
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Defaults for the `query` command.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Index file to query. Defaults to `<dist_dir>/registry.index.json`.
    #[serde(default)]
    pub index: Option<PathBuf>,
}

impl PathsConfig {
    /// Path of the generated search index.
    pub fn index_file(&self) -> PathBuf {
        self.dist_dir.join("registry.index.json")
    }

    /// Path of the generated capability map.
    pub fn capabilities_file(&self) -> PathBuf {
        self.dist_dir.join("capabilities.json")
    }

    /// Path of the generated build metadata.
    pub fn meta_file(&self) -> PathBuf {
        self.dist_dir.join("derived.meta.json")
    }
}

impl AppConfig {
    /// Load configuration from a TOML file at the given path using async I/O.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let config = Self::parse(&content)?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let paths = [
            ("paths.registry", &self.paths.registry),
            ("paths.rules_dir", &self.paths.rules_dir),
            ("paths.bundles_dir", &self.paths.bundles_dir),
            ("paths.dist_dir", &self.paths.dist_dir),
        ];
        for (key, path) in paths {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
        }

        if let Some(index) = &self.query.index
            && index.as_os_str().is_empty()
        {
            return Err(ConfigError::Validation(
                "query.index must not be empty when set".to_string(),
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "logging.level must be one of {:?}, got {:?}",
                valid_levels, self.logging.level
            )));
        }

        Ok(())
    }

    /// The index file the `query` command reads.
    pub fn index_path(&self) -> PathBuf {
        self.query
            .index
            .clone()
            .unwrap_or_else(|| self.paths.index_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.paths.registry, PathBuf::from("registry.json"));
        assert_eq!(config.paths.rules_dir, PathBuf::from("bundles/rules"));
        assert_eq!(config.paths.bundles_dir, PathBuf::from("bundles"));
        assert_eq!(config.paths.dist_dir, PathBuf::from("dist"));
        assert_eq!(config.logging.level, "info");
        assert!(config.query.index.is_none());
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config.paths.registry, PathBuf::from("registry.json"));
    }

    #[test]
    fn test_parse_full_toml() {
        let toml = r#"
            [paths]
            registry = "data/registry.json"
            rules_dir = "rules"
            bundles_dir = "out/bundles"
            dist_dir = "out/dist"

            [logging]
            level = "debug"

            [query]
            index = "cache/index.json"
        "#;
        let config = AppConfig::parse(toml).unwrap();
        assert_eq!(config.paths.registry, PathBuf::from("data/registry.json"));
        assert_eq!(config.paths.rules_dir, PathBuf::from("rules"));
        assert_eq!(config.paths.bundles_dir, PathBuf::from("out/bundles"));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.index_path(), PathBuf::from("cache/index.json"));
    }

    #[test]
    fn test_derived_file_locations() {
        let toml = r#"
            [paths]
            dist_dir = "build"
        "#;
        let config = AppConfig::parse(toml).unwrap();
        assert_eq!(
            config.paths.index_file(),
            PathBuf::from("build/registry.index.json")
        );
        assert_eq!(
            config.paths.capabilities_file(),
            PathBuf::from("build/capabilities.json")
        );
        assert_eq!(
            config.paths.meta_file(),
            PathBuf::from("build/derived.meta.json")
        );
        assert_eq!(config.index_path(), config.paths.index_file());
    }

    #[test]
    fn test_validation_rejects_empty_registry_path() {
        let toml = r#"
            [paths]
            registry = ""
        "#;
        let err = AppConfig::parse(toml).unwrap_err();
        assert!(err.to_string().contains("paths.registry"));
    }

    #[test]
    fn test_validation_rejects_empty_query_index() {
        let toml = r#"
            [query]
            index = ""
        "#;
        assert!(AppConfig::parse(toml).is_err());
    }

    #[test]
    fn test_validation_rejects_bad_log_level() {
        let toml = r#"
            [logging]
            level = "verbose"
        "#;
        let err = AppConfig::parse(toml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Validation("bad value".to_string());
        assert_eq!(err.to_string(), "validation error: bad value");
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("toolreg.toml");
        tokio::fs::write(&path, b"[paths]\nregistry = \"tools.json\"\n")
            .await
            .unwrap();

        let config = AppConfig::load(&path).await.unwrap();
        assert_eq!(config.paths.registry, PathBuf::from("tools.json"));
    }

    #[tokio::test]
    async fn test_load_nonexistent_file() {
        let result = AppConfig::load(Path::new("/nonexistent/toolreg.toml")).await;
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[tokio::test]
    async fn test_load_invalid_toml_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.toml");
        tokio::fs::write(&path, b"not valid toml [[[").await.unwrap();

        let result = AppConfig::load(&path).await;
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
