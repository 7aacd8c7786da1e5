//! Ecosystem summary: most common tags, bundle sizes, and totals.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::bundle::Bundle;
use crate::registry::RecordStore;

/// Number of tags listed by default.
pub const DEFAULT_TOP_TAGS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Count {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub tools: usize,
    /// Tools not flagged as deprecated.
    pub active: usize,
    pub bundles: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Facets {
    /// Most used tags, by descending count then name.
    pub top_tags: Vec<Count>,
    /// Every bundle with its size, by name.
    pub bundles: Vec<Count>,
    pub totals: Totals,
}

/// Summarize the registry and its bundles.
pub fn facets(store: &RecordStore, bundles: &[Bundle], top_tags: usize) -> Facets {
    let mut tag_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for tag in store.iter().flat_map(|record| record.tags.iter()) {
        *tag_counts.entry(tag.as_str()).or_default() += 1;
    }

    let mut tags: Vec<Count> = tag_counts
        .into_iter()
        .map(|(name, count)| Count {
            name: name.to_string(),
            count,
        })
        .collect();
    // Stable sort over name-ordered input: ties stay alphabetical.
    tags.sort_by(|a, b| b.count.cmp(&a.count));
    tags.truncate(top_tags);

    let mut bundle_counts: Vec<Count> = bundles
        .iter()
        .map(|bundle| Count {
            name: bundle.id.clone(),
            count: bundle.tools.len(),
        })
        .collect();
    bundle_counts.sort_by(|a, b| a.name.cmp(&b.name));

    Facets {
        top_tags: tags,
        totals: Totals {
            tools: store.len(),
            active: store.iter().filter(|record| !record.deprecated).count(),
            bundles: bundle_counts.len(),
        },
        bundles: bundle_counts,
    }
}
