//! `tracing` subscriber setup for binaries and tests embedding the composer.
//!
//! The composer itself only emits events; installing a subscriber is left to
//! the application. These helpers install a `fmt` layer filtered by
//! `RUST_LOG`, falling back to `invocation_composer=info`.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_FILTER: &str = "invocation_composer=info";

fn env_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into())
}

/// Installs the global subscriber.
///
/// # Panics
///
/// Panics if a global subscriber is already installed; use [`try_init`]
/// where that can happen.
pub fn init() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Installs the global subscriber unless one is already set.
///
/// Returns `false` if another subscriber was already installed.
pub fn try_init() -> bool {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init()
        .is_ok()
}
