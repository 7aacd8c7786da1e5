//! Configuration builders for tests.

use std::path::Path;

use toolreg_config::AppConfig;

/// Fluent builder for [`AppConfig`] in tests.
///
/// ```ignore
/// let config = TestConfigBuilder::new()
///     .rooted_at(tmp.path())
///     .log_level("debug")
///     .build();
/// ```
pub struct TestConfigBuilder {
    config: AppConfig,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    /// Resolve every default path relative to `root`.
    pub fn rooted_at(mut self, root: &Path) -> Self {
        let paths = &mut self.config.paths;
        paths.registry = root.join(&paths.registry);
        paths.rules_dir = root.join(&paths.rules_dir);
        paths.bundles_dir = root.join(&paths.bundles_dir);
        paths.dist_dir = root.join(&paths.dist_dir);
        self
    }

    pub fn registry(mut self, path: &Path) -> Self {
        self.config.paths.registry = path.to_path_buf();
        self
    }

    pub fn dist_dir(mut self, path: &Path) -> Self {
        self.config.paths.dist_dir = path.to_path_buf();
        self
    }

    pub fn query_index(mut self, path: &Path) -> Self {
        self.config.query.index = Some(path.to_path_buf());
        self
    }

    pub fn log_level(mut self, level: &str) -> Self {
        self.config.logging.level = level.to_string();
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
