//! Fuzz target for the query engine.
//!
//! Run with: cargo +nightly fuzz run fuzz_query
//!
//! The first byte picks which filters are set; the rest is used as the free
//! text and as the filter values.

#![no_main]

use libfuzzer_sys::fuzz_target;
use toolreg_core::{Query, RecordStore, ToolRecord, index};

fuzz_target!(|data: &[u8]| {
    let Some((&flags, rest)) = data.split_first() else {
        return;
    };
    let text = String::from_utf8_lossy(rest).into_owned();
    let pick = |bit: u8| (flags & bit != 0).then(|| text.clone());

    let Ok(store) = RecordStore::from_records(vec![
        ToolRecord::new("tool-scan", "Tool Scan")
            .with_description("Scans MCP servers for tools")
            .with_tags(["core", "mcp"])
            .with_capabilities(["net"]),
        ToolRecord::new("file-compass", "File Compass").with_tags(["core"]),
    ]) else {
        return;
    };
    let Ok(built) = index::build(&store, &[]) else {
        return;
    };

    let query = Query {
        id: pick(0b0000_0001),
        tag: pick(0b0000_0010),
        bundle: pick(0b0000_0100),
        capability: pick(0b0000_1000),
        text: pick(0b0001_0000),
        explain: flags & 0b0010_0000 != 0,
    };
    let first = toolreg_core::query::query(&built.entries, &query);
    let second = toolreg_core::query::query(&built.entries, &query);

    assert_eq!(first, second);
    assert!(first.windows(2).all(|w| w[0].score >= w[1].score));
    if !query.explain {
        assert!(first.iter().all(|r| r.reasons.is_empty()));
    }
});
