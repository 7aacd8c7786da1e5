//! Query Engine — filters and ranks index entries.
//!
//! A query runs in two stages over a read-only index:
//!
//! 1. **Filter.** Each supplied filter must hold, checked in a fixed order:
//!    id, bundle, tag, capability.
//! 2. **Rank.** Only when free text is given. Surviving entries are scored
//!    against the lower-cased text; entries scoring zero are dropped and the
//!    rest are stable-sorted by descending score, so equal scores keep the
//!    ascending-id order of the index.
//!
//! | signal                                        | points |
//! |-----------------------------------------------|--------|
//! | id equals the text                            | 100    |
//! | a keyword equals the text                     | 50     |
//! | id or lower-cased name starts with the text   | 30     |
//! | lower-cased description contains the text     | 10     |
//! | each keyword containing the text              | 5      |
//!
//! The text is scored as a single string; multi-word queries only match
//! through prefix and substring signals.

use serde::Serialize;

use crate::index::IndexEntry;

pub const EXACT_ID_SCORE: u32 = 100;
pub const EXACT_KEYWORD_SCORE: u32 = 50;
pub const PREFIX_SCORE: u32 = 30;
pub const DESCRIPTION_SCORE: u32 = 10;
pub const KEYWORD_SUBSTRING_SCORE: u32 = 5;

/// A filter/ranking request against the index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub id: Option<String>,
    pub tag: Option<String>,
    pub bundle: Option<String>,
    pub capability: Option<String>,
    pub text: Option<String>,
    /// Record why each entry matched.
    pub explain: bool,
}

impl Query {
    /// The free text to rank by, if ranking applies.
    fn ranking_text(&self) -> Option<String> {
        self.text
            .as_deref()
            .filter(|text| !text.is_empty())
            .map(str::to_lowercase)
    }
}

/// An index entry that passed a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredResult {
    pub entry: IndexEntry,
    pub score: u32,
    /// Contributing filters and signals, in the order they fired. Empty
    /// unless the query asked for an explanation.
    pub reasons: Vec<String>,
}

impl ScoredResult {
    fn new(entry: &IndexEntry) -> Self {
        Self {
            entry: entry.clone(),
            score: 0,
            reasons: Vec::new(),
        }
    }

    /// Serializable view. Score fields are included only when `explain` is set.
    pub fn view(&self, explain: bool) -> ResultView<'_> {
        ResultView {
            entry: &self.entry,
            score: explain.then_some(self.score),
            reasons: explain.then_some(self.reasons.as_slice()),
        }
    }
}

/// JSON shape of a result: the index entry plus optional `_score`/`_reasons`.
#[derive(Debug, Serialize)]
pub struct ResultView<'a> {
    #[serde(flatten)]
    entry: &'a IndexEntry,
    #[serde(rename = "_score", skip_serializing_if = "Option::is_none")]
    score: Option<u32>,
    #[serde(rename = "_reasons", skip_serializing_if = "Option::is_none")]
    reasons: Option<&'a [String]>,
}

/// Outcome of scoring one entry against the query text.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TextScore {
    pub score: u32,
    pub reasons: Vec<String>,
}

/// Score `entry` against already lower-cased `text`.
pub fn score_text(entry: &IndexEntry, text: &str) -> TextScore {
    let mut scored = TextScore::default();
    let mut add = |points: u32, reason: String| {
        scored.score += points;
        scored.reasons.push(reason);
    };

    if entry.id == text {
        add(EXACT_ID_SCORE, "Exact ID match".to_string());
    }
    if entry.keywords.contains(text) {
        add(EXACT_KEYWORD_SCORE, "Exact keyword match".to_string());
    }
    if entry.id.starts_with(text) || entry.name.to_lowercase().starts_with(text) {
        add(PREFIX_SCORE, "Prefix match".to_string());
    }
    if entry.description.to_lowercase().contains(text) {
        add(DESCRIPTION_SCORE, "Description substring match".to_string());
    }
    let keyword_hits = entry.keywords.iter().filter(|k| k.contains(text)).count() as u32;
    if keyword_hits > 0 {
        add(
            KEYWORD_SUBSTRING_SCORE * keyword_hits,
            format!("Keyword match ({keyword_hits})"),
        );
    }

    scored
}

fn filter_stage(entry: &IndexEntry, query: &Query) -> Option<ScoredResult> {
    let mut result = ScoredResult::new(entry);
    let mut pass = |matched: bool, reason: String| {
        if matched && query.explain {
            result.reasons.push(reason);
        }
        matched
    };

    if let Some(id) = &query.id
        && !pass(entry.id == *id, format!("ID match: {}", entry.id))
    {
        return None;
    }
    if let Some(bundle) = &query.bundle
        && !pass(
            entry.bundle_membership.contains(bundle),
            format!("In bundle: {bundle}"),
        )
    {
        return None;
    }
    if let Some(tag) = &query.tag
        && !pass(entry.tags.contains(tag), format!("Has tag: {tag}"))
    {
        return None;
    }
    if let Some(capability) = &query.capability
        && !pass(
            entry.capabilities.contains(capability),
            format!("Has capability: {capability}"),
        )
    {
        return None;
    }

    Some(result)
}

/// Run `query` against `index`.
///
/// Pure: the same index and query always give the same results in the same
/// order.
pub fn query(index: &[IndexEntry], query: &Query) -> Vec<ScoredResult> {
    let filtered = index.iter().filter_map(|entry| filter_stage(entry, query));

    let Some(text) = query.ranking_text() else {
        return filtered.collect();
    };

    let mut ranked: Vec<ScoredResult> = filtered
        .filter_map(|mut result| {
            let scored = score_text(&result.entry, &text);
            if scored.score == 0 {
                return None;
            }
            result.score += scored.score;
            if query.explain {
                result.reasons.extend(scored.reasons);
            }
            Some(result)
        })
        .collect();

    // `sort_by` is stable: equal scores keep index order.
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn entry(id: &str, name: &str, description: &str, keywords: &[&str]) -> IndexEntry {
        IndexEntry {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            keywords: set(keywords),
            tags: BTreeSet::new(),
            bundle_membership: BTreeSet::new(),
            capabilities: BTreeSet::new(),
            capabilities_declared: false,
        }
    }

    fn index() -> Vec<IndexEntry> {
        let mut suite = entry(
            "accessibility-suite",
            "Accessibility Suite",
            "Audits pages",
            &["accessibility", "audits", "pages", "suite"],
        );
        suite.tags = set(&["a11y", "web"]);
        suite.bundle_membership = set(&["web"]);

        let mut compass = entry(
            "file-compass",
            "File Compass",
            "Navigate files",
            &["compass", "file", "files", "navigate"],
        );
        compass.tags = set(&["core"]);
        compass.bundle_membership = set(&["core"]);
        compass.capabilities = set(&["fs-read"]);
        compass.capabilities_declared = true;

        let mut probe = entry(
            "page-probe",
            "Page Probe",
            "Checks accessibility of a page",
            &["checks", "page", "probe"],
        );
        probe.tags = set(&["web"]);
        probe.bundle_membership = set(&["web"]);

        let mut scan = entry(
            "tool-scan",
            "Tool Scan",
            "Scans tools",
            &["core", "scan", "scans", "tool", "tools"],
        );
        scan.tags = set(&["core"]);
        scan.bundle_membership = set(&["core"]);

        vec![suite, compass, probe, scan]
    }

    fn ids(results: &[ScoredResult]) -> Vec<&str> {
        results.iter().map(|r| r.entry.id.as_str()).collect()
    }

    #[test]
    fn test_no_filters_returns_everything_in_index_order() {
        let results = query(&index(), &Query::default());
        assert_eq!(
            ids(&results),
            vec!["accessibility-suite", "file-compass", "page-probe", "tool-scan"]
        );
        assert!(results.iter().all(|r| r.score == 0));
    }

    #[test]
    fn test_id_filter_is_exact() {
        let q = Query {
            id: Some("tool-scan".to_string()),
            ..Query::default()
        };
        assert_eq!(ids(&query(&index(), &q)), vec!["tool-scan"]);

        let q = Query {
            id: Some("tool".to_string()),
            ..Query::default()
        };
        assert!(query(&index(), &q).is_empty());
    }

    #[test]
    fn test_filters_combine_with_and() {
        let q = Query {
            bundle: Some("core".to_string()),
            capability: Some("fs-read".to_string()),
            ..Query::default()
        };
        assert_eq!(ids(&query(&index(), &q)), vec!["file-compass"]);

        let q = Query {
            tag: Some("web".to_string()),
            bundle: Some("core".to_string()),
            ..Query::default()
        };
        assert!(query(&index(), &q).is_empty());
    }

    #[test]
    fn test_scoring_example() {
        let q = Query {
            text: Some("accessibility".to_string()),
            ..Query::default()
        };
        let results = query(&index(), &q);
        assert_eq!(ids(&results), vec!["accessibility-suite", "page-probe"]);
        // keyword 50 + prefix 30 + 1 keyword substring 5
        assert_eq!(results[0].score, 85);
        assert!(results[0].score >= EXACT_KEYWORD_SCORE);
        assert_eq!(results[1].score, DESCRIPTION_SCORE);
    }

    #[test]
    fn test_exact_id_scores_all_signals() {
        let scored = score_text(&index()[3], "tool-scan");
        assert_eq!(scored.score, EXACT_ID_SCORE + PREFIX_SCORE);
        assert_eq!(scored.reasons, vec!["Exact ID match", "Prefix match"]);
    }

    #[test]
    fn test_keyword_substring_counts_each_keyword() {
        // "scan" is an exact keyword and a substring of "scan" and "scans".
        let scored = score_text(&index()[3], "scan");
        assert_eq!(
            scored.score,
            EXACT_KEYWORD_SCORE + DESCRIPTION_SCORE + 2 * KEYWORD_SUBSTRING_SCORE
        );
        assert_eq!(scored.reasons.last().unwrap(), "Keyword match (2)");
    }

    #[test]
    fn test_text_is_lowercased_once() {
        let q = Query {
            text: Some("COMPASS".to_string()),
            ..Query::default()
        };
        assert_eq!(ids(&query(&index(), &q)), vec!["file-compass"]);
    }

    #[test]
    fn test_zero_score_entries_are_dropped() {
        let q = Query {
            text: Some("zzz".to_string()),
            ..Query::default()
        };
        assert!(query(&index(), &q).is_empty());
    }

    #[test]
    fn test_empty_text_skips_ranking() {
        let q = Query {
            text: Some(String::new()),
            ..Query::default()
        };
        assert_eq!(query(&index(), &q).len(), 4);
    }

    #[test]
    fn test_equal_scores_keep_id_order() {
        let q = Query {
            text: Some("page".to_string()),
            ..Query::default()
        };
        let results = query(&index(), &q);
        // page-probe: keyword 50 + prefix 30 + description 10 + keyword 5 = 95
        // accessibility-suite: description 10 + keyword "pages" 5 = 15
        assert_eq!(ids(&results), vec!["page-probe", "accessibility-suite"]);

        let q = Query {
            text: Some("s".to_string()),
            tag: Some("core".to_string()),
            ..Query::default()
        };
        let results = query(&index(), &q);
        let scores: Vec<_> = results.iter().map(|r| r.score).collect();
        assert_eq!(ids(&results), vec!["tool-scan", "file-compass"]);
        assert!(scores[0] > scores[1]);

        let tied = vec![
            entry("alpha-tool", "Alpha", "", &["shared"]),
            entry("beta-tool", "Beta", "", &["shared"]),
            entry("gamma-tool", "Gamma", "", &["shared"]),
        ];
        let q = Query {
            text: Some("shared".to_string()),
            ..Query::default()
        };
        let results = query(&tied, &q);
        assert_eq!(ids(&results), vec!["alpha-tool", "beta-tool", "gamma-tool"]);
        assert!(results.iter().all(|r| r.score == results[0].score));
    }

    #[test]
    fn test_reasons_only_in_explain_mode() {
        let mut q = Query {
            bundle: Some("web".to_string()),
            text: Some("accessibility".to_string()),
            ..Query::default()
        };
        let quiet = query(&index(), &q);
        assert!(quiet.iter().all(|r| r.reasons.is_empty()));

        q.explain = true;
        let explained = query(&index(), &q);
        assert_eq!(
            explained[0].reasons,
            vec![
                "In bundle: web",
                "Exact keyword match",
                "Prefix match",
                "Keyword match (1)"
            ]
        );
        // Explanations never change ranking.
        assert_eq!(ids(&quiet), ids(&explained));
        let quiet_scores: Vec<_> = quiet.iter().map(|r| r.score).collect();
        let explained_scores: Vec<_> = explained.iter().map(|r| r.score).collect();
        assert_eq!(quiet_scores, explained_scores);
    }

    #[test]
    fn test_filter_reasons_follow_fixed_order() {
        let q = Query {
            id: Some("tool-scan".to_string()),
            tag: Some("core".to_string()),
            bundle: Some("core".to_string()),
            explain: true,
            ..Query::default()
        };
        let results = query(&index(), &q);
        assert_eq!(
            results[0].reasons,
            vec!["ID match: tool-scan", "In bundle: core", "Has tag: core"]
        );
    }

    #[test]
    fn test_view_hides_score_unless_explaining() {
        let q = Query {
            text: Some("tool".to_string()),
            explain: true,
            ..Query::default()
        };
        let results = query(&index(), &q);

        let plain = serde_json::to_value(results[0].view(false)).unwrap();
        assert!(plain.get("_score").is_none());
        assert!(plain.get("_reasons").is_none());
        assert_eq!(plain["id"], "tool-scan");

        let explained = serde_json::to_value(results[0].view(true)).unwrap();
        assert_eq!(explained["_score"], results[0].score);
        assert!(explained["_reasons"].is_array());
    }

    #[test]
    fn test_query_is_repeatable() {
        let q = Query {
            text: Some("s".to_string()),
            explain: true,
            ..Query::default()
        };
        assert_eq!(query(&index(), &q), query(&index(), &q));
    }
}
