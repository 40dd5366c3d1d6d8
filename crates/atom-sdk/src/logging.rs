//! Log setup for plugin binaries
//!
//! Plugins log through `tracing`. The agent captures stderr into the build
//! log, so the subscriber writes there.

use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

pub const DEFAULT_LOG_FILTER: &str = "atom_sdk=info,atom_demo=info";

pub fn init() {
    init_with_default(DEFAULT_LOG_FILTER);
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over
/// `default_filter`.
pub fn init_with_default(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false),
        )
        .init();
}

pub fn init_dev() {
    init_with_default("atom_sdk=debug,atom_demo=debug");
}
