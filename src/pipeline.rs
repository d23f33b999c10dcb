//! The two analyses, each a single pass from CSV to figures.

use crate::charts::{ChartData, ChartPlotter};
use crate::config::{Paths, HEATMAP_COLUMNS};
use crate::data::{write_csv, DataLoader, DataProcessor};
use crate::stats::{CorrelationMatrix, StatsCalculator, MIN_FIT_POINTS};
use anyhow::{Context, Result};
use polars::prelude::DataFrame;
use std::path::Path;
use tracing::{info, warn};

fn load(path: &Path) -> Result<DataFrame> {
    let mut loader = DataLoader::new();
    loader
        .load_csv(path)
        .with_context(|| format!("loading {}", path.display()))?;
    Ok(loader.into_dataframe()?)
}

/// Load the migration/economic table and append Net_Migration.
pub fn prepare_migration_table(path: &Path) -> Result<DataFrame> {
    let df = load(path)?;
    let df = DataProcessor::add_net_migration(df).context("deriving Net_Migration")?;
    Ok(df)
}

/// Correlate the heatmap indicators, render the heatmap and print the matrix.
pub fn run_correlation_heatmap(paths: &Paths) -> Result<CorrelationMatrix> {
    let df = prepare_migration_table(&paths.migration_csv())?;

    let matrix = StatsCalculator::correlation_matrix(&df, &HEATMAP_COLUMNS)
        .context("computing correlation matrix")?;
    info!(
        columns = matrix.size(),
        requested = HEATMAP_COLUMNS.len(),
        "correlation matrix ready"
    );

    let out = paths.heatmap_png();
    ChartPlotter::draw_correlation_heatmap(&matrix, &out)
        .with_context(|| format!("rendering {}", out.display()))?;

    println!("Saved heatmap to {}", out.display());
    println!("{}", matrix);
    Ok(matrix)
}

/// Clean knife crime, project emigration and inner-join them on Year.
pub fn prepare_knifecrime_emigration(paths: &Paths) -> Result<DataFrame> {
    let knife = load(&paths.knife_csv())?;
    let knife = DataProcessor::clean_knife_crime(&knife).context("cleaning knife-crime table")?;

    let migration = load(&paths.migration_csv())?;
    let emigration =
        DataProcessor::emigration_projection(&migration).context("selecting Emigration")?;

    let merged = DataProcessor::merge_on_year(&emigration, &knife).context("merging on Year")?;
    info!(rows = merged.height(), "merged emigration with knife crime");
    Ok(merged)
}

/// Write the derived CSV, then the timeline and the scatter.
pub fn run_knifecrime_emigration(paths: &Paths) -> Result<DataFrame> {
    let mut merged = prepare_knifecrime_emigration(paths)?;

    let csv = paths.derived_csv();
    write_csv(&mut merged, &csv).with_context(|| format!("writing {}", csv.display()))?;

    let data = ChartData::from_merged(&merged).context("decoding merged table")?;
    if data.is_empty() {
        warn!("no years in common; figures will have no data");
    } else {
        info!(years = data.len(), "plotting merged years");
    }

    let timeline = paths.timeline_png();
    ChartPlotter::draw_timeline(&data, &timeline)
        .with_context(|| format!("rendering {}", timeline.display()))?;

    let (xs, ys) = data.paired_points();
    let fit = StatsCalculator::linear_fit(&xs, &ys);
    if fit.is_none() {
        warn!(
            points = xs.len(),
            min = MIN_FIT_POINTS,
            "not enough spread or points for a trend line"
        );
    }

    let scatter = paths.scatter_png();
    ChartPlotter::draw_scatter(&data, fit.as_ref(), &scatter)
        .with_context(|| format!("rendering {}", scatter.display()))?;

    println!("Saved figures and derived CSV.");
    Ok(merged)
}
