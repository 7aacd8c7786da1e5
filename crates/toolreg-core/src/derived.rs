//! Derived artifacts written next to the index: the capability map and the
//! build metadata stamp.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::registry::RecordStore;

#[derive(Debug, thiserror::Error)]
pub enum DerivedError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Lower-cased capability -> sorted ids of the tools declaring it.
///
/// Records without a `capabilities` field contribute nothing.
pub fn capability_map(store: &RecordStore) -> BTreeMap<String, BTreeSet<String>> {
    let mut map: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for record in store.iter() {
        for capability in record.capabilities.iter().flatten() {
            map.entry(capability.to_lowercase())
                .or_default()
                .insert(record.id.clone());
        }
    }
    map
}

/// Provenance of a derived build, written as `derived.meta.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMeta {
    pub generated_at: String,
    /// Hex SHA-256 of the raw registry document.
    pub registry_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_version: Option<String>,
    pub tool_count: usize,
}

impl DerivedMeta {
    /// Stamp a build of `store`, whose source document was `raw_registry`.
    pub fn new(raw_registry: &str, store: &RecordStore, generated_at: DateTime<Utc>) -> Self {
        Self {
            generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            registry_hash: registry_hash(raw_registry),
            schema_version: store.schema_version().cloned(),
            registry_version: store.version().map(str::to_string),
            tool_count: store.len(),
        }
    }
}

/// Hex-encoded SHA-256 of the registry document bytes.
pub fn registry_hash(raw_registry: &str) -> String {
    hex::encode(Sha256::digest(raw_registry.as_bytes()))
}

/// Serialize `value` as pretty JSON into `path`, creating parent directories.
pub async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), DerivedError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| DerivedError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    let io_err = |source| DerivedError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }
    tokio::fs::write(path, json).await.map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ToolRecord;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_capability_map_lowercases_and_sorts() {
        let store = RecordStore::from_records(vec![
            ToolRecord::new("zeta-tool", "Zeta").with_capabilities(["FS-Read", "net"]),
            ToolRecord::new("alpha-tool", "Alpha").with_capabilities(["fs-read"]),
            ToolRecord::new("plain-tool", "Plain"),
            ToolRecord::new("empty-caps", "Empty").with_capabilities(Vec::<String>::new()),
        ])
        .unwrap();

        let map = capability_map(&store);
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "fs-read": ["alpha-tool", "zeta-tool"],
                "net": ["zeta-tool"]
            })
        );
    }

    #[test]
    fn test_meta_records_registry_provenance() {
        let raw = r#"{ "schema_version": 2, "version": "1.4.0", "tools": [ { "id": "a-tool", "name": "A" } ] }"#;
        let store = RecordStore::from_json(raw).unwrap();
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();

        let meta = DerivedMeta::new(raw, &store, at);
        assert_eq!(meta.generated_at, "2026-01-02T03:04:05.000Z");
        assert_eq!(meta.schema_version, Some(Value::from(2)));
        assert_eq!(meta.registry_version.as_deref(), Some("1.4.0"));
        assert_eq!(meta.tool_count, 1);
        assert_eq!(meta.registry_hash.len(), 64);
    }

    #[test]
    fn test_registry_hash_is_sha256_hex() {
        assert_eq!(
            registry_hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[tokio::test]
    async fn test_write_json_creates_parent() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("dist").join("capabilities.json");
        write_json(&path, &serde_json::json!({ "net": ["a"] }))
            .await
            .unwrap();
        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(written.contains("\"net\""));
    }
}
