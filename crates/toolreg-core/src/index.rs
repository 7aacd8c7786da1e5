//! Index Builder — search-ready projection of every tool record.
//!
//! Each [`IndexEntry`] carries the record's tokenized keywords and the names
//! of every bundle it belongs to. Entries are ordered by id and every
//! set-valued field is sorted, so identical input always produces an
//! identical index file.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::bundle::Bundle;
use crate::diagnostics::Diagnostics;
use crate::registry::{RecordStore, ToolRecord};
use crate::tokenize::tokenize;

/// Errors raised while building, writing or reading the index.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("tool record at position {position} has an empty `{field}`")]
    MissingField {
        position: usize,
        field: &'static str,
    },

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid index JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One searchable tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub keywords: BTreeSet<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub bundle_membership: BTreeSet<String>,
    #[serde(default)]
    pub capabilities: BTreeSet<String>,
    /// False when the source record has no `capabilities` field at all.
    #[serde(default)]
    pub capabilities_declared: bool,
}

impl IndexEntry {
    fn from_record(record: &ToolRecord, bundle_membership: BTreeSet<String>) -> Self {
        let mut keywords = tokenize(&record.name);
        keywords.extend(tokenize(&record.description));
        keywords.extend(record.tags.iter().map(|tag| tag.to_lowercase()));

        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            description: record.description.clone(),
            keywords,
            tags: record.tags.clone(),
            bundle_membership,
            capabilities: record.capabilities.clone().unwrap_or_default(),
            capabilities_declared: record.capabilities.is_some(),
        }
    }
}

/// A freshly built index.
#[derive(Debug, Clone, Default)]
pub struct IndexBuild {
    pub entries: Vec<IndexEntry>,
    pub diagnostics: Diagnostics,
}

/// Invert bundle tool lists into `tool id -> bundle names`.
///
/// Tool ids not present in the store are reported and dropped.
pub fn bundle_membership(
    store: &RecordStore,
    bundles: &[Bundle],
    diagnostics: &mut Diagnostics,
) -> BTreeMap<String, BTreeSet<String>> {
    let mut membership: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for bundle in bundles {
        for tool in &bundle.tools {
            if !store.contains(tool) {
                diagnostics.warn(format!(
                    "bundle \"{}\" references unknown tool id \"{tool}\"",
                    bundle.id
                ));
                continue;
            }
            membership
                .entry(tool.clone())
                .or_default()
                .insert(bundle.id.clone());
        }
    }
    membership
}

/// Build the index for every record in the store.
///
/// Fails without producing any entries if a record has an empty id or name.
pub fn build(store: &RecordStore, bundles: &[Bundle]) -> Result<IndexBuild, IndexError> {
    for (position, record) in store.iter().enumerate() {
        if record.id.trim().is_empty() {
            return Err(IndexError::MissingField {
                position,
                field: "id",
            });
        }
        if record.name.trim().is_empty() {
            return Err(IndexError::MissingField {
                position,
                field: "name",
            });
        }
    }

    let mut diagnostics = Diagnostics::new();
    let mut membership = bundle_membership(store, bundles, &mut diagnostics);

    let entries = store
        .sorted()
        .into_iter()
        .map(|record| {
            let bundles = membership.remove(&record.id).unwrap_or_default();
            IndexEntry::from_record(record, bundles)
        })
        .collect();

    Ok(IndexBuild {
        entries,
        diagnostics,
    })
}

/// Pretty-printed JSON array, as written to disk.
pub fn to_json(entries: &[IndexEntry]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(entries)
}

/// Write the index file, creating its parent directory if needed.
pub async fn write_index(path: &Path, entries: &[IndexEntry]) -> Result<(), IndexError> {
    let json = to_json(entries).map_err(|source| IndexError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let io_err = |source| IndexError::Io {
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

/// Read an index file produced by [`write_index`].
pub async fn load_index(path: &Path) -> Result<Vec<IndexEntry>, IndexError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| IndexError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_str(&content).map_err(|source| IndexError::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn store() -> RecordStore {
        RecordStore::from_records(vec![
            ToolRecord::new("tool-scan", "Tool Scan")
                .with_description("Scans MCP servers for tools")
                .with_tags(["core", "Scanner"]),
            ToolRecord::new("accessibility-suite", "Accessibility Suite")
                .with_description("WCAG audits for web apps")
                .with_tags(["a11y"])
                .with_capabilities(["audit", "report"]),
            ToolRecord::new("file-compass", "File Compass").with_tags(["core"]),
        ])
        .unwrap()
    }

    fn bundles() -> Vec<Bundle> {
        vec![
            Bundle {
                id: "core".to_string(),
                description: String::new(),
                tools: vec!["file-compass".to_string(), "tool-scan".to_string()],
            },
            Bundle {
                id: "all".to_string(),
                description: String::new(),
                tools: vec!["tool-scan".to_string()],
            },
        ]
    }

    #[test]
    fn test_entries_sorted_by_id() {
        let built = build(&store(), &bundles()).unwrap();
        let ids: Vec<_> = built.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["accessibility-suite", "file-compass", "tool-scan"]);
    }

    #[test]
    fn test_keywords_combine_name_description_and_tags() {
        let built = build(&store(), &bundles()).unwrap();
        let scan = built.entries.iter().find(|e| e.id == "tool-scan").unwrap();
        assert_eq!(
            scan.keywords,
            set(&["core", "for", "mcp", "scan", "scanner", "scans", "servers", "tool", "tools"])
        );
        // Tags keep their original casing; only keywords are lower-cased.
        assert_eq!(scan.tags, set(&["Scanner", "core"]));
    }

    #[test]
    fn test_bundle_membership_inverted_and_sorted() {
        let built = build(&store(), &bundles()).unwrap();
        let by_id = |id: &str| built.entries.iter().find(|e| e.id == id).unwrap().clone();
        assert_eq!(by_id("tool-scan").bundle_membership, set(&["all", "core"]));
        assert_eq!(by_id("file-compass").bundle_membership, set(&["core"]));
        assert!(by_id("accessibility-suite").bundle_membership.is_empty());
    }

    #[test]
    fn test_capabilities_keep_declared_flag() {
        let built = build(&store(), &[]).unwrap();
        let suite = &built.entries[0];
        assert_eq!(suite.capabilities, set(&["audit", "report"]));
        assert!(suite.capabilities_declared);

        let compass = &built.entries[1];
        assert!(compass.capabilities.is_empty());
        assert!(!compass.capabilities_declared);
    }

    #[test]
    fn test_unknown_bundle_member_warns() {
        let mut bundles = bundles();
        bundles[0].tools.push("ghost".to_string());
        let built = build(&store(), &bundles).unwrap();
        assert_eq!(built.diagnostics.len(), 1);
        assert!(built.entries.iter().all(|e| e.id != "ghost"));
    }

    #[test]
    fn test_empty_name_fails_whole_build() {
        let store = RecordStore::from_records(vec![
            ToolRecord::new("good", "Good"),
            ToolRecord::new("blank", "  "),
        ])
        .unwrap();
        let err = build(&store, &[]).unwrap_err();
        assert!(matches!(
            err,
            IndexError::MissingField {
                position: 1,
                field: "name"
            }
        ));
    }

    #[test]
    fn test_build_is_deterministic() {
        let a = to_json(&build(&store(), &bundles()).unwrap().entries).unwrap();
        let b = to_json(&build(&store(), &bundles()).unwrap().entries).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_membership_serializes_as_array() {
        let built = build(&store(), &[]).unwrap();
        let value = serde_json::to_value(&built.entries[0]).unwrap();
        assert_eq!(value["bundle_membership"], serde_json::json!([]));
        assert_eq!(value["capabilities"], serde_json::json!(["audit", "report"]));
    }

    #[tokio::test]
    async fn test_write_and_load_index() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("dist").join("registry.index.json");
        let built = build(&store(), &bundles()).unwrap();

        write_index(&path, &built.entries).await.unwrap();
        let loaded = load_index(&path).await.unwrap();
        assert_eq!(loaded, built.entries);
    }

    #[tokio::test]
    async fn test_load_index_rejects_bad_json() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("registry.index.json");
        tokio::fs::write(&path, "[{]").await.unwrap();
        assert!(matches!(
            load_index(&path).await,
            Err(IndexError::Json { .. })
        ));
    }
}
