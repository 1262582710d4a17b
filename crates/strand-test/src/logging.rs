//! Tracing setup for tests and benches

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn,strand_state=debug,strand_sync=debug";

/// Install a test-writer subscriber. `RUST_LOG` overrides the default
/// filter; repeated calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
