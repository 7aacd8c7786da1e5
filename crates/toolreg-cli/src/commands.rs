//! Command implementations. Each reads its inputs through the configured
//! paths, reports diagnostics through `tracing`, and writes its artifacts.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use toolreg_config::AppConfig;
use toolreg_core::bundle::{self, LoadedBundles};
use toolreg_core::derived::{self, DerivedMeta};
use toolreg_core::facets::{self as facet_stats, DEFAULT_TOP_TAGS, Facets};
use toolreg_core::{Bundle, Diagnostics, Query, RecordStore, ScoredResult, Severity, index};
use tracing::{debug, error, info, warn};

/// What the `index` command produced.
#[derive(Debug)]
pub struct IndexSummary {
    pub index_file: PathBuf,
    pub entries: usize,
    pub capabilities: usize,
    pub meta_file: PathBuf,
}

/// Surface core diagnostics as log events.
pub fn report(diagnostics: &Diagnostics) {
    for diagnostic in diagnostics {
        match diagnostic.severity {
            Severity::Warning => warn!("{}", diagnostic.message),
            Severity::Error => error!("{}", diagnostic.message),
        }
    }
}

async fn read_registry(path: &Path) -> Result<(String, RecordStore)> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read registry {}", path.display()))?;
    let store = RecordStore::from_json(&raw)
        .with_context(|| format!("invalid registry {}", path.display()))?;
    info!(path = %path.display(), tools = store.len(), "Loaded registry");
    Ok((raw, store))
}

/// Read generated bundles, treating a missing directory as "no bundles yet".
async fn read_bundles(dir: &Path) -> Result<Vec<Bundle>> {
    let exists = tokio::fs::try_exists(dir)
        .await
        .with_context(|| format!("failed to check bundles directory {}", dir.display()))?;
    if !exists {
        warn!(dir = %dir.display(), "Bundles directory not found, continuing without bundles");
        return Ok(Vec::new());
    }
    let LoadedBundles {
        bundles,
        diagnostics,
    } = bundle::load_bundles(dir)
        .await
        .with_context(|| format!("failed to list bundles in {}", dir.display()))?;
    report(&diagnostics);
    Ok(bundles)
}

/// Resolve every rule set and write one bundle file per rule set.
pub async fn bundles(config: &AppConfig) -> Result<Vec<Bundle>> {
    let paths = &config.paths;
    let (_, store) = read_registry(&paths.registry).await?;
    let sources = toolreg_core::ruleset::load_rule_sets(&paths.rules_dir)
        .await
        .context("failed to load rule sets")?;
    debug!(count = sources.len(), "Loaded rule sets");

    let bundles: Vec<Bundle> = toolreg_core::resolve_all(&store, &sources)
        .into_iter()
        .map(|resolution| {
            report(&resolution.diagnostics);
            resolution.bundle
        })
        .collect();

    let written = bundle::write_bundles(&paths.bundles_dir, &bundles)
        .await
        .context("failed to write bundles")?;
    for (bundle, path) in bundles.iter().zip(&written) {
        info!(bundle = %bundle.id, tools = bundle.tools.len(), path = %path.display(), "Wrote bundle");
    }
    Ok(bundles)
}

/// Build the index, the capability map, and the build metadata.
pub async fn index(config: &AppConfig) -> Result<IndexSummary> {
    let paths = &config.paths;
    let (raw, store) = read_registry(&paths.registry).await?;
    let bundles = read_bundles(&paths.bundles_dir).await?;

    let built = index::build(&store, &bundles).context("failed to build index")?;
    report(&built.diagnostics);

    let index_file = paths.index_file();
    index::write_index(&index_file, &built.entries)
        .await
        .context("failed to write index")?;
    info!(path = %index_file.display(), entries = built.entries.len(), "Wrote index");

    let capabilities = derived::capability_map(&store);
    derived::write_json(&paths.capabilities_file(), &capabilities)
        .await
        .context("failed to write capability map")?;

    let meta = DerivedMeta::new(&raw, &store, Utc::now());
    let meta_file = paths.meta_file();
    derived::write_json(&meta_file, &meta)
        .await
        .context("failed to write build metadata")?;
    debug!(hash = %meta.registry_hash, "Wrote build metadata");

    Ok(IndexSummary {
        index_file,
        entries: built.entries.len(),
        capabilities: capabilities.len(),
        meta_file,
    })
}

/// Run a query against the index file at `index_path`.
pub async fn query(index_path: &Path, query: &Query) -> Result<Vec<ScoredResult>> {
    let entries = index::load_index(index_path)
        .await
        .with_context(|| format!("failed to load index {}", index_path.display()))?;
    let results = toolreg_core::query::query(&entries, query);
    debug!(entries = entries.len(), results = results.len(), "Query complete");
    Ok(results)
}

/// Summarize the registry and the generated bundles.
pub async fn facets(config: &AppConfig) -> Result<Facets> {
    let (_, store) = read_registry(&config.paths.registry).await?;
    let bundles = read_bundles(&config.paths.bundles_dir).await?;
    Ok(facet_stats::facets(&store, &bundles, DEFAULT_TOP_TAGS))
}
