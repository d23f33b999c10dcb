//! Fixed input/output locations and the heatmap column selection.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Indicators shown in the correlation heatmap, in display order.
pub const HEATMAP_COLUMNS: [&str; 9] = [
    "Immigration",
    "Emigration",
    "Net_Migration",
    "GDP",
    "Unemployment",
    "GBP_EUR",
    "GBP_USD",
    "Avg_House_Price",
    "Population",
];

const MIGRATION_CSV: &str = "master_migration_economic_1991_2024.csv";
const KNIFE_CSV: &str = "knife_enabled_crime_uk.csv";
const HEATMAP_PNG: &str = "correlation_heatmap.png";
const TIMELINE_PNG: &str = "emigration_vs_knifecrime_timeline.png";
const SCATTER_PNG: &str = "emigration_vs_knifecrime_scatter.png";
const DERIVED_CSV: &str = "knifecrime_emigration_2011_2024_clean.csv";

/// Data, figures and derived-output directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub data_dir: PathBuf,
    pub figures_dir: PathBuf,
    pub derived_dir: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self::under(".")
    }
}

impl Paths {
    /// Standard layout rooted at `root`.
    pub fn under(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let data_dir = root.join("data");
        Self {
            derived_dir: data_dir.join("derived"),
            figures_dir: root.join("figures"),
            data_dir,
        }
    }

    /// Create the figures and derived directories if absent.
    pub fn ensure_output_dirs(&self) -> io::Result<()> {
        for dir in [&self.figures_dir, &self.derived_dir] {
            fs::create_dir_all(dir)?;
            debug!(dir = %dir.display(), "output directory ready");
        }
        Ok(())
    }

    pub fn migration_csv(&self) -> PathBuf {
        self.data_dir.join(MIGRATION_CSV)
    }

    pub fn knife_csv(&self) -> PathBuf {
        self.data_dir.join(KNIFE_CSV)
    }

    pub fn heatmap_png(&self) -> PathBuf {
        self.figures_dir.join(HEATMAP_PNG)
    }

    pub fn timeline_png(&self) -> PathBuf {
        self.figures_dir.join(TIMELINE_PNG)
    }

    pub fn scatter_png(&self) -> PathBuf {
        self.figures_dir.join(SCATTER_PNG)
    }

    pub fn derived_csv(&self) -> PathBuf {
        self.derived_dir.join(DERIVED_CSV)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_is_relative() {
        let paths = Paths::default();
        assert_eq!(
            paths.migration_csv(),
            Path::new("./data/master_migration_economic_1991_2024.csv")
        );
        assert_eq!(
            paths.derived_csv(),
            Path::new("./data/derived/knifecrime_emigration_2011_2024_clean.csv")
        );
        assert_eq!(
            paths.heatmap_png(),
            Path::new("./figures/correlation_heatmap.png")
        );
    }

    #[test]
    fn ensure_output_dirs_creates_both() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::under(dir.path());
        paths.ensure_output_dirs().unwrap();
        assert!(paths.figures_dir.is_dir());
        assert!(paths.derived_dir.is_dir());
        // Idempotent.
        paths.ensure_output_dirs().unwrap();
    }
}
