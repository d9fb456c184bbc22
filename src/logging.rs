// src/logging.rs
// =============================================================================
// tracing subscriber setup.
//
// Filtering comes from RUST_LOG when set, e.g.
//   RUST_LOG=portfolio_api=debug,tower_http=debug
// and falls back to `portfolio_api=info`. Log lines go to stderr so command
// output on stdout stays machine-readable.
// =============================================================================

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "portfolio_api=info";

/// The filter from RUST_LOG, or [`DEFAULT_FILTER`] when unset or invalid.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber. Safe to call more than once; later calls
/// are no-ops.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
