//! Migration Analysis - runs both analyses against the default layout.

use anyhow::{Context, Result};
use migration_indicators::config::Paths;
use migration_indicators::{init_tracing, pipeline};

fn main() -> Result<()> {
    init_tracing();

    let paths = Paths::default();
    paths
        .ensure_output_dirs()
        .context("creating output directories")?;

    pipeline::run_correlation_heatmap(&paths)?;
    pipeline::run_knifecrime_emigration(&paths)?;
    Ok(())
}
