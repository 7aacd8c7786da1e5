//! Tracing initialisation helpers for tests.
//!
//! The subscriber is initialised at most once per process, so
//! [`init_test_tracing`] is safe to call from every test function.

use tracing_subscriber::EnvFilter;

/// Directive used when `RUST_LOG` is unset: our crates at debug, the rest quiet.
const DEFAULT_DIRECTIVE: &str = "warn,toolreg_core=debug,toolreg_config=debug";

/// Initialise a tracing subscriber that writes to the test-harness writer
/// and respects the `RUST_LOG` environment variable.
///
/// ```ignore
/// #[tokio::test]
/// async fn my_test() {
///     toolreg_test_utils::tracing_setup::init_test_tracing();
///     tracing::debug!("visible in captured test output");
/// }
/// ```
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE)),
        )
        .with_test_writer()
        .try_init();
}
