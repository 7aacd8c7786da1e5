//! Human-readable renderings for stdout.

use std::fmt::Write;

use toolreg_core::facets::Facets;
use toolreg_core::{Bundle, ScoredResult};

use crate::commands::IndexSummary;

fn join<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    items
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Query results in the `Found N tools` listing format.
pub fn render_results(results: &[ScoredResult], explain: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Found {} tools", results.len());
    let _ = writeln!(out, "---");
    for result in results {
        let entry = &result.entry;
        let _ = writeln!(out, "{} ({})", entry.name, entry.id);
        let _ = writeln!(out, "   {}", entry.description);
        if !entry.tags.is_empty() {
            let _ = writeln!(out, "   Tags: {}", join(&entry.tags));
        }
        if !entry.bundle_membership.is_empty() {
            let _ = writeln!(out, "   Bundles: {}", join(&entry.bundle_membership));
        }
        if explain && !result.reasons.is_empty() {
            let _ = writeln!(out, "   Why: {}", join(&result.reasons));
        }
        out.push('\n');
    }
    out
}

pub fn render_bundle_summary(bundles: &[Bundle]) -> String {
    let mut out = String::new();
    for bundle in bundles {
        let _ = writeln!(out, "{}: {} tools", bundle.id, bundle.tools.len());
    }
    let _ = writeln!(out, "Generated {} bundles", bundles.len());
    out
}

pub fn render_index_summary(summary: &IndexSummary) -> String {
    format!(
        "Indexed {} tools into {}\nMapped {} capabilities\nWrote {}\n",
        summary.entries,
        summary.index_file.display(),
        summary.capabilities,
        summary.meta_file.display(),
    )
}

pub fn render_facets(facets: &Facets) -> String {
    let mut out = String::from("Registry Facets\n===============\n");

    let _ = writeln!(out, "\nTop Tags");
    for tag in &facets.top_tags {
        let _ = writeln!(out, "  - {}: {}", tag.name, tag.count);
    }

    let _ = writeln!(out, "\nBundles");
    if facets.bundles.is_empty() {
        let _ = writeln!(out, "  (none generated)");
    }
    for bundle in &facets.bundles {
        let _ = writeln!(out, "  - {}: {} tools", bundle.name, bundle.count);
    }

    let totals = &facets.totals;
    let _ = writeln!(out, "\nTotals");
    let _ = writeln!(out, "  Tools: {}", totals.tools);
    let _ = writeln!(out, "  Active: {}", totals.active);
    let _ = writeln!(out, "  Bundles: {}", totals.bundles);
    out
}
