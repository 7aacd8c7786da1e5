//! Bundle artifacts — the resolved output of a rule set.
//!
//! Bundles are written as `<bundles_dir>/<id>.json` and read back by the
//! index builder to compute bundle membership.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::diagnostics::Diagnostics;
use crate::ruleset::RULES_SUFFIX;

/// Errors raised while writing bundle files.
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize bundle {id}: {source}")]
    Serialize {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A named, sorted subset of tool ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bundle {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub description: String,
    /// Tool ids in ascending order.
    #[serde(default)]
    pub tools: Vec<String>,
}

impl Bundle {
    /// Pretty-printed JSON, as written to disk.
    pub fn to_json(&self) -> Result<String, BundleError> {
        serde_json::to_string_pretty(self).map_err(|source| BundleError::Serialize {
            id: self.id.clone(),
            source,
        })
    }

    /// File name this bundle is written under.
    pub fn file_name(&self) -> String {
        format!("{}.json", self.id)
    }
}

/// Write every bundle into `dir`, creating it if needed.
///
/// All bundles are serialized before the first file is touched, so a
/// serialization failure leaves the directory unchanged.
pub async fn write_bundles(dir: &Path, bundles: &[Bundle]) -> Result<Vec<PathBuf>, BundleError> {
    let rendered = bundles
        .iter()
        .map(|b| Ok((dir.join(b.file_name()), b.to_json()?)))
        .collect::<Result<Vec<_>, BundleError>>()?;

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| BundleError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

    let mut written = Vec::with_capacity(rendered.len());
    for (path, json) in rendered {
        tokio::fs::write(&path, json)
            .await
            .map_err(|source| BundleError::Io {
                path: path.clone(),
                source,
            })?;
        written.push(path);
    }
    Ok(written)
}

/// Bundles read back from disk, plus warnings for files that were skipped.
#[derive(Debug, Default)]
pub struct LoadedBundles {
    pub bundles: Vec<Bundle>,
    pub diagnostics: Diagnostics,
}

/// Read every generated bundle file in `dir`.
///
/// Only `*.json` files directly inside `dir` are considered, skipping
/// rule-set documents. Each bundle is named after its file stem. A
/// file that cannot be read or parsed is reported and skipped; the others
/// still load. Failing to list `dir` at all is an error.
pub async fn load_bundles(dir: &Path) -> Result<LoadedBundles, BundleError> {
    let io_err = |source| BundleError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await.map_err(io_err)?;
    while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".json") && !name.ends_with(RULES_SUFFIX) {
            files.push(name);
        }
    }
    files.sort();

    let mut loaded = LoadedBundles::default();
    for name in files {
        let path = dir.join(&name);
        let parsed = match tokio::fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str::<Bundle>(&content).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        match parsed {
            Ok(mut bundle) => {
                bundle.id = name.trim_end_matches(".json").to_string();
                debug!(bundle = %bundle.id, tools = bundle.tools.len(), "Loaded bundle");
                loaded.bundles.push(bundle);
            }
            Err(e) => loaded
                .diagnostics
                .warn(format!("failed to read bundle {name}: {e}")),
        }
    }
    Ok(loaded)
}
