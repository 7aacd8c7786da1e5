//! Rule Resolver — turns a rule set into a deterministic [`Bundle`].
//!
//! Resolution is a fold over the rule list. Each rule maps the current
//! inclusion set to a new one, and every intermediate set is kept in
//! [`Resolution::steps`]. Exclusions run once, after all inclusion rules:
//!
//! ```text
//! {} ─rule 1─▶ S1 ─rule 2─▶ S2 ─ … ─▶ Sn ─exclude─▶ sorted Bundle.tools
//! ```
//!
//! Unknown ids referenced by a rule are reported as warnings and skipped.

use std::collections::BTreeSet;

use tracing::debug;

use crate::bundle::Bundle;
use crate::diagnostics::Diagnostics;
use crate::registry::RecordStore;
use crate::ruleset::{Exclude, Operator, Rule, RuleSetSource};

/// The outcome of resolving one rule set.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub bundle: Bundle,
    /// Inclusion set after each rule, in rule order.
    pub steps: Vec<BTreeSet<String>>,
    pub diagnostics: Diagnostics,
}

/// Apply one inclusion rule to `included`, returning the next set.
pub fn apply_rule(
    store: &RecordStore,
    included: &BTreeSet<String>,
    rule: &Rule,
    diagnostics: &mut Diagnostics,
) -> BTreeSet<String> {
    let mut next = included.clone();

    if let Some(ids) = &rule.ids {
        for id in ids {
            if store.contains(id) {
                next.insert(id.clone());
            } else {
                diagnostics.warn(format!("rule references unknown tool id \"{id}\""));
            }
        }
    }

    if let Some(tags) = &rule.tags {
        let matched = store.iter().filter(|record| match rule.operator {
            Operator::Or => record.has_any_tag(tags),
            Operator::And => record.has_all_tags(tags),
        });
        next.extend(matched.map(|record| record.id.clone()));
    }

    next
}

/// Remove explicitly excluded ids and, if requested, deprecated tools.
pub fn apply_exclusions(
    store: &RecordStore,
    included: BTreeSet<String>,
    exclude: &Exclude,
) -> BTreeSet<String> {
    included
        .into_iter()
        .filter(|id| !exclude.ids.contains(id))
        .filter(|id| {
            !exclude.deprecated || !store.get(id).is_some_and(|record| record.deprecated)
        })
        .collect()
}

/// Resolve a single rule set against the store.
pub fn resolve(store: &RecordStore, source: &RuleSetSource) -> Resolution {
    let rule_set = &source.rule_set;
    let mut diagnostics = Diagnostics::new();

    let steps: Vec<BTreeSet<String>> = rule_set
        .rules
        .iter()
        .scan(BTreeSet::new(), |included, rule| {
            *included = apply_rule(store, included, rule, &mut diagnostics);
            Some(included.clone())
        })
        .collect();

    let included = steps.last().cloned().unwrap_or_default();
    let remaining = apply_exclusions(store, included, &rule_set.exclude);
    debug!(
        bundle = %source.bundle_id(),
        rules = rule_set.rules.len(),
        tools = remaining.len(),
        "Resolved rule set"
    );

    Resolution {
        bundle: Bundle {
            id: source.bundle_id(),
            description: rule_set.description.clone(),
            // BTreeSet iteration is already ascending by id.
            tools: remaining.into_iter().collect(),
        },
        steps,
        diagnostics,
    }
}

/// Resolve every rule set, in the order given.
///
/// Two rule sets producing the same bundle id are reported as an error on the
/// later one, since its file overwrites the earlier.
pub fn resolve_all(store: &RecordStore, sources: &[RuleSetSource]) -> Vec<Resolution> {
    let mut seen: BTreeSet<String> = BTreeSet::new();
    sources
        .iter()
        .map(|source| {
            let mut resolution = resolve(store, source);
            if !seen.insert(resolution.bundle.id.clone()) {
                resolution.diagnostics.error(format!(
                    "bundle id \"{}\" from {} was already produced by another rule set",
                    resolution.bundle.id, source.origin
                ));
            }
            resolution
        })
        .collect()
}
