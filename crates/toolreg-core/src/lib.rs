#![deny(unsafe_code)]

//! toolreg core — bundle resolution and search over a tool registry.
//!
//! The pipeline runs in one direction:
//!
//! ```text
//! registry.json ─▶ RecordStore ─▶ resolver ─▶ Bundles ─┐
//!                       │                              ▼
//!                       └──────────────────────▶ index::build ─▶ Index ─▶ query
//! ```
//!
//! Loading and writing files happens at the edges (`load_*`, `write_*`).
//! Everything in between is a synchronous pure function of its inputs.
//! Recoverable problems come back as [`Diagnostics`]; structural problems are
//! errors and abort the run.

/// Compile-time build metadata (version, git hash, profile).
pub mod build_info;
/// Bundle artifacts and their on-disk form.
pub mod bundle;
/// Capability map and build metadata artifacts.
pub mod derived;
/// Warnings and non-fatal errors returned by core operations.
pub mod diagnostics;
/// Tag and bundle statistics.
pub mod facets;
/// Index Builder.
pub mod index;
/// Query Engine.
pub mod query;
/// Record Store.
pub mod registry;
/// Rule Resolver.
pub mod resolver;
/// Rule-set documents.
pub mod ruleset;
/// Keyword tokenizer.
pub mod tokenize;

pub use bundle::Bundle;
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use index::IndexEntry;
pub use query::{Query, ScoredResult};
pub use registry::{RecordStore, ToolRecord};
pub use resolver::{Resolution, resolve, resolve_all};
pub use ruleset::{Exclude, Operator, Rule, RuleSet, RuleSetSource};
