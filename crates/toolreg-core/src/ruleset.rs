//! Rule-set documents — declarative inclusion/exclusion policies over tools.
//!
//! A rule set lives in `<rules_dir>/<name>.rules.json`:
//!
//! ```json
//! {
//!   "name": "core",
//!   "description": "Essential tools",
//!   "rules": [
//!     { "tags": ["core"] },
//!     { "tags": ["security", "audit"], "operator": "AND" },
//!     { "ids": ["file-compass"] }
//!   ],
//!   "exclude": { "ids": ["legacy-scan"], "deprecated": true }
//! }
//! ```
//!
//! Any document that does not match this shape is rejected outright.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// File suffix identifying rule-set documents.
pub const RULES_SUFFIX: &str = ".rules.json";

/// Errors raised while reading rule sets. Fatal for the whole run.
#[derive(Debug, thiserror::Error)]
pub enum RuleSetError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed rule set {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rule set {origin} has invalid name {name:?}: {reason}")]
    InvalidName {
        origin: String,
        name: String,
        reason: &'static str,
    },
}

/// How a rule combines its tag list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    /// The record carries at least one of the tags.
    #[default]
    #[serde(rename = "OR", alias = "or")]
    Or,
    /// The record carries every one of the tags.
    #[serde(rename = "AND", alias = "and")]
    And,
}

/// A single inclusion rule.
///
/// Explicit ids and tag conditions are independent: when both are present,
/// their matches are unioned rather than combined as one predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeSet<String>>,
    #[serde(default)]
    pub operator: Operator,
}

impl Rule {
    /// A rule listing explicit ids.
    pub fn ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: Some(ids.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// A rule matching tags with [`Operator::Or`].
    pub fn any_tag<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: Some(tags.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// A rule matching tags with [`Operator::And`].
    pub fn all_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            operator: Operator::And,
            ..Self::any_tag(tags)
        }
    }
}

/// Post-inclusion removals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exclude {
    #[serde(default)]
    pub ids: BTreeSet<String>,
    /// Drop every included tool flagged as deprecated.
    #[serde(default)]
    pub deprecated: bool,
}

/// A parsed rule-set document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub exclude: Exclude,
}

impl RuleSet {
    /// Parse a rule-set document. `origin` names the source in errors.
    ///
    /// A `name` becomes a bundle file name, so it must be a single path
    /// component that cannot be mistaken for a rule-set document.
    pub fn from_json(origin: &str, content: &str) -> Result<Self, RuleSetError> {
        let rule_set: RuleSet =
            serde_json::from_str(content).map_err(|source| RuleSetError::Parse {
                origin: origin.to_string(),
                source,
            })?;
        if let Some(name) = &rule_set.name
            && let Err(reason) = check_bundle_name(name)
        {
            return Err(RuleSetError::InvalidName {
                origin: origin.to_string(),
                name: name.clone(),
                reason,
            });
        }
        Ok(rule_set)
    }
}

fn check_bundle_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("must not be empty");
    }
    if name == "." || name == ".." {
        return Err("must not be a relative path component");
    }
    if name.contains(['/', '\\']) {
        return Err("must not contain path separators");
    }
    if format!("{name}.json").ends_with(RULES_SUFFIX) {
        return Err("must not end in `.rules`");
    }
    Ok(())
}

/// A rule set together with the file it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSetSource {
    /// File name of the document, e.g. `core.rules.json`.
    pub origin: String,
    pub rule_set: RuleSet,
}

impl RuleSetSource {
    pub fn new(origin: impl Into<String>, rule_set: RuleSet) -> Self {
        Self {
            origin: origin.into(),
            rule_set,
        }
    }

    /// The id of the bundle this rule set produces: its `name`, or the file
    /// name with the rules suffix removed.
    pub fn bundle_id(&self) -> String {
        if let Some(name) = &self.rule_set.name {
            return name.clone();
        }
        self.origin
            .strip_suffix(RULES_SUFFIX)
            .unwrap_or(&self.origin)
            .to_string()
    }
}

/// Read every `*.rules.json` document in `dir`, ordered by file name.
///
/// Stops at the first unreadable or malformed document.
pub async fn load_rule_sets(dir: &Path) -> Result<Vec<RuleSetSource>, RuleSetError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| RuleSetError::Io { path, source }
    };

    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await.map_err(io_err(dir))?;
    while let Some(entry) = entries.next_entry().await.map_err(io_err(dir))? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(RULES_SUFFIX) {
            names.push(name);
        }
    }
    names.sort();

    let mut sources = Vec::with_capacity(names.len());
    for name in names {
        let path = dir.join(&name);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(io_err(&path))?;
        let rule_set = RuleSet::from_json(&name, &content)?;
        sources.push(RuleSetSource::new(name, rule_set));
    }
    Ok(sources)
}
