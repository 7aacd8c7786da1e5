//! Record Store — the in-memory registry of tool records.
//!
//! The registry document is a JSON object with a `tools` array. Each entry is
//! checked once here, at the load boundary, and turned into a strongly typed
//! [`ToolRecord`]. Everything downstream works on the validated form only.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Errors raised while loading the registry. All of them are fatal for the run.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to read registry: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse registry JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("tools[{index}] is missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },

    #[error("duplicate tool id \"{0}\"")]
    DuplicateId(String),
}

/// A single tool in the registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolRecord {
    /// Unique lower-kebab-case identifier.
    pub id: String,
    pub name: String,
    pub description: String,
    pub tags: BTreeSet<String>,
    pub deprecated: bool,
    /// `None` when the record does not declare the field at all, which is
    /// distinct from an explicitly empty list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<BTreeSet<String>>,
    /// Every other field of the source record, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ToolRecord {
    /// Create a record with only the required fields set.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            tags: BTreeSet::new(),
            deprecated: false,
            capabilities: None,
            extra: Map::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = Some(capabilities.into_iter().map(Into::into).collect());
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    /// Whether the record carries every tag in `tags`.
    pub fn has_all_tags(&self, tags: &BTreeSet<String>) -> bool {
        tags.is_subset(&self.tags)
    }

    /// Whether the record carries at least one tag in `tags`.
    pub fn has_any_tag(&self, tags: &BTreeSet<String>) -> bool {
        !self.tags.is_disjoint(tags)
    }
}

/// Wire shape of one `tools[]` entry before validation.
#[derive(Debug, Deserialize)]
struct RawTool {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    deprecated: Option<bool>,
    #[serde(default)]
    capabilities: Option<Vec<String>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl RawTool {
    fn validate(self, index: usize) -> Result<ToolRecord, RegistryError> {
        let id = self.id.ok_or(RegistryError::MissingField { index, field: "id" })?;
        let name = self
            .name
            .ok_or(RegistryError::MissingField { index, field: "name" })?;

        Ok(ToolRecord {
            id,
            name,
            description: self.description.unwrap_or_default(),
            tags: self.tags.unwrap_or_default().into_iter().collect(),
            deprecated: self.deprecated.unwrap_or(false),
            capabilities: self.capabilities.map(|caps| caps.into_iter().collect()),
            extra: self.extra,
        })
    }
}

/// Wire shape of the registry document.
#[derive(Debug, Deserialize)]
struct RawRegistry {
    #[serde(default)]
    schema_version: Option<Value>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    tools: Vec<RawTool>,
}

/// The loaded registry: records in source order plus an id lookup.
///
/// Read-only once constructed.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<ToolRecord>,
    by_id: HashMap<String, usize>,
    schema_version: Option<Value>,
    version: Option<String>,
}

impl RecordStore {
    /// Build a store from already-typed records.
    pub fn from_records(records: Vec<ToolRecord>) -> Result<Self, RegistryError> {
        let mut by_id = HashMap::with_capacity(records.len());
        for (pos, record) in records.iter().enumerate() {
            if by_id.insert(record.id.clone(), pos).is_some() {
                return Err(RegistryError::DuplicateId(record.id.clone()));
            }
        }
        Ok(Self {
            records,
            by_id,
            schema_version: None,
            version: None,
        })
    }

    /// Parse and validate a registry document.
    pub fn from_json(content: &str) -> Result<Self, RegistryError> {
        let raw: RawRegistry = serde_json::from_str(content)?;
        let records = raw
            .tools
            .into_iter()
            .enumerate()
            .map(|(index, tool)| tool.validate(index))
            .collect::<Result<Vec<_>, _>>()?;

        let mut store = Self::from_records(records)?;
        store.schema_version = raw.schema_version;
        store.version = raw.version;
        Ok(store)
    }

    /// Load the registry document at `path`.
    pub async fn load(path: &Path) -> Result<Self, RegistryError> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_json(&content)
    }

    pub fn get(&self, id: &str) -> Option<&ToolRecord> {
        self.by_id.get(id).map(|&pos| &self.records[pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Records in source order.
    pub fn iter(&self) -> impl Iterator<Item = &ToolRecord> {
        self.records.iter()
    }

    /// Records ordered by id.
    pub fn sorted(&self) -> Vec<&ToolRecord> {
        let mut records: Vec<&ToolRecord> = self.records.iter().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The `schema_version` of the source document, as written.
    pub fn schema_version(&self) -> Option<&Value> {
        self.schema_version.as_ref()
    }

    /// The `version` of the source document, if any.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}
