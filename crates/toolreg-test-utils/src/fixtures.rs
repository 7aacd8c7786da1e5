//! Registry and rule-set fixtures.
//!
//! The sample registry is small but covers every shape the pipeline cares
//! about: shared tags, a deprecated tool, declared and absent capabilities.

use serde_json::{Value, json};
use toolreg_core::{RecordStore, ToolRecord};

/// Tool ids in [`sample_records`], in source order.
pub const SAMPLE_IDS: [&str; 5] = [
    "tool-scan",
    "file-compass",
    "accessibility-suite",
    "legacy-lint",
    "prompt-forge",
];

/// Five records spanning the `core`, `a11y`, `lint` and `ai` tags.
pub fn sample_records() -> Vec<ToolRecord> {
    vec![
        ToolRecord::new("tool-scan", "Tool Scan")
            .with_description("Scans MCP servers and lists their tools")
            .with_tags(["core", "mcp", "scanner"])
            .with_capabilities(["fs-read", "net"]),
        ToolRecord::new("file-compass", "File Compass")
            .with_description("Semantic file search across repositories")
            .with_tags(["core", "search"])
            .with_capabilities(["fs-read"]),
        ToolRecord::new("accessibility-suite", "Accessibility Suite")
            .with_description("WCAG audits for every web page")
            .with_tags(["a11y", "web"]),
        ToolRecord::new("legacy-lint", "Legacy Lint")
            .with_description("Style checks for old codebases")
            .with_tags(["lint", "core"])
            .deprecated(),
        ToolRecord::new("prompt-forge", "Prompt Forge")
            .with_description("Prompt templates for assistants")
            .with_tags(["ai"])
            .with_capabilities(Vec::<String>::new()),
    ]
}

/// [`sample_records`] loaded into a store.
pub fn sample_store() -> RecordStore {
    RecordStore::from_records(sample_records()).expect("sample ids are unique")
}

/// Registry document for `records`, in the on-disk `{ "tools": [...] }` shape.
pub fn registry_document(records: &[ToolRecord]) -> Value {
    json!({
        "schema_version": 1,
        "version": "0.1.0",
        "tools": records,
    })
}

/// Rule-set documents that pair with [`sample_records`], keyed by file name.
pub fn sample_rule_sets() -> Vec<(&'static str, Value)> {
    vec![
        (
            "core.rules.json",
            json!({
                "name": "core",
                "description": "Everyday core tooling",
                "rules": [ { "tags": ["core"] } ],
                "exclude": { "deprecated": true }
            }),
        ),
        (
            "web-audit.rules.json",
            json!({
                "description": "Web and accessibility",
                "rules": [
                    { "tags": ["a11y", "web"], "operator": "AND" },
                    { "ids": ["file-compass", "missing-tool"] }
                ]
            }),
        ),
    ]
}
