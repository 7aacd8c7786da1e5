//! Fuzz target for rule-set parsing and resolution.
//!
//! Run with: cargo +nightly fuzz run fuzz_rule_set_parser
//!
//! Feeds arbitrary bytes to `RuleSet::from_json` and resolves whatever
//! parses against a small fixed registry.

#![no_main]

use libfuzzer_sys::fuzz_target;
use toolreg_core::{RecordStore, RuleSet, RuleSetSource, ToolRecord, resolve};

fuzz_target!(|data: &[u8]| {
    let Ok(content) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(rule_set) = RuleSet::from_json("fuzz.rules.json", content) else {
        return;
    };

    let Ok(store) = RecordStore::from_records(vec![
        ToolRecord::new("tool-scan", "Tool Scan").with_tags(["core", "mcp"]),
        ToolRecord::new("legacy-lint", "Legacy Lint")
            .with_tags(["core"])
            .deprecated(),
    ]) else {
        return;
    };

    let rule_count = rule_set.rules.len();
    let resolution = resolve(&store, &RuleSetSource::new("fuzz.rules.json", rule_set));
    assert_eq!(resolution.steps.len(), rule_count);
    assert!(resolution.bundle.tools.windows(2).all(|w| w[0] < w[1]));
    assert!(resolution.bundle.tools.iter().all(|id| store.contains(id)));
});
