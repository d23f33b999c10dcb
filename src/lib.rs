//! Migration Indicators - correlation and knife-crime analyses
//!
//! Loads the migration/economic and knife-crime CSV files, derives the
//! cleaned tables and renders static PNG figures.

pub mod charts;
pub mod config;
pub mod data;
pub mod pipeline;
pub mod stats;

use tracing_subscriber::EnvFilter;

/// Install the stderr fmt subscriber, `info` unless `RUST_LOG` says otherwise.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
