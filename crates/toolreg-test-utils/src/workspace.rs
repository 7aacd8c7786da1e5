//! On-disk workspace helpers.
//!
//! Helpers for laying out a registry, rule sets and a config file under a
//! temporary directory, so pipeline and CLI tests can run against real files.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::TempDir;
use toolreg_config::AppConfig;
use toolreg_core::ToolRecord;

use crate::config::TestConfigBuilder;
use crate::fixtures;

/// A test-scoped toolreg workspace.
///
/// The temp directory is deleted automatically when this value is dropped,
/// guaranteeing cleanup even on panic.
pub struct TestWorkspace {
    pub config: AppConfig,
    pub config_path: PathBuf,
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// An empty workspace with default relative paths rooted in a temp dir.
    pub async fn empty() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let config = TestConfigBuilder::new().rooted_at(temp_dir.path()).build();
        let config_path = temp_dir.path().join("toolreg.toml");
        Self {
            config,
            config_path,
            temp_dir,
        }
    }

    /// A workspace holding the sample registry and rule sets.
    pub async fn sample() -> Self {
        let workspace = Self::with_records(&fixtures::sample_records()).await;
        for (file_name, document) in fixtures::sample_rule_sets() {
            workspace.write_rule_set(file_name, &document).await;
        }
        workspace
    }

    /// A workspace whose registry holds exactly `records`.
    pub async fn with_records(records: &[ToolRecord]) -> Self {
        let workspace = Self::empty().await;
        workspace
            .write_registry(&fixtures::registry_document(records))
            .await;
        workspace
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Overwrite the registry file with `document`.
    pub async fn write_registry(&self, document: &Value) {
        write_pretty(&self.config.paths.registry, document).await;
    }

    /// Add or replace a rule-set file in the rules directory.
    pub async fn write_rule_set(&self, file_name: &str, document: &Value) {
        write_pretty(&self.config.paths.rules_dir.join(file_name), document).await;
    }

    /// Write raw text into the rules directory, for malformed-input tests.
    pub async fn write_rule_set_raw(&self, file_name: &str, content: &str) {
        write_raw(&self.config.paths.rules_dir.join(file_name), content).await;
    }

    /// Write the config file that points at this workspace's paths.
    pub async fn write_config(&self) {
        let paths = &self.config.paths;
        let toml = format!(
            "[paths]\nregistry = {:?}\nrules_dir = {:?}\nbundles_dir = {:?}\ndist_dir = {:?}\n",
            paths.registry, paths.rules_dir, paths.bundles_dir, paths.dist_dir,
        );
        write_raw(&self.config_path, &toml).await;
    }
}

async fn write_pretty(path: &Path, document: &Value) {
    let json = serde_json::to_string_pretty(document).expect("fixture JSON serializes");
    write_raw(path, &json).await;
}

async fn write_raw(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .expect("failed to create fixture dir");
    }
    tokio::fs::write(path, content)
        .await
        .expect("failed to write fixture file");
}
