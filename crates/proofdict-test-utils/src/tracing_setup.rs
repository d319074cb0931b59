//! Tracing for tests.
//!
//! Most tests use `#[test_log::test]`; [`init_test_tracing`] covers helpers
//! and fixtures that run outside such a test body. The subscriber is installed
//! at most once per process.

use tracing_subscriber::EnvFilter;

/// Default filter: scan and fetch events from the core crate, warnings
/// from everything else.
pub const DEFAULT_TEST_FILTER: &str = "warn,proofdict_core=debug";

/// Install a subscriber writing to the test harness.
///
/// `RUST_LOG` takes precedence over [`DEFAULT_TEST_FILTER`].
///
/// ```ignore
/// proofdict_test_utils::tracing_setup::init_test_tracing();
/// let report = fixture.scanner.scan(&document).await;
/// ```
pub fn init_test_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_TEST_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .with_target(true)
        .try_init();
}
