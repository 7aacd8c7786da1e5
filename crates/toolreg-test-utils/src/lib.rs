#![deny(unsafe_code)]

//! Shared test utilities for the toolreg workspace.
//!
//! Provides registry fixtures, config builders, an on-disk temp workspace,
//! and tracing helpers so that individual crate tests stay concise.
//!
//! Add this crate as a `[dev-dependency]` in any workspace member:
//!
//! ```toml
//! [dev-dependencies]
//! toolreg-test-utils = { workspace = true }
//! ```

pub mod config;
pub mod fixtures;
pub mod tracing_setup;
pub mod workspace;
