//! Data Processor Module
//! Handles derived indicators, knife-crime cleaning and the Year merge.

use super::loader::{column_as_f64, column_as_i64, YEAR_COLUMN};
use polars::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

pub const IMMIGRATION: &str = "Immigration";
pub const EMIGRATION: &str = "Emigration";
pub const NET_MIGRATION: &str = "Net_Migration";
pub const KNIFE_CRIME_TOTAL: &str = "Knife_Crime_Total";

/// Offence categories summed into `Knife_Crime_Total`.
pub const KNIFE_CATEGORY_COLUMNS: [&str; 4] = [
    "Assault with injury and assault with intent to cause serious harm",
    "Robbery",
    "Threats to kill",
    "Other selected offences",
];

/// Year the knife-crime source mislabels as `MISLABELLED_AS_YEAR`.
pub const REPAIRED_YEAR: i64 = 2014;
pub const MISLABELLED_AS_YEAR: i64 = 2024;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Missing required column: {0}")]
    MissingColumn(String),
}

/// Handles data cleaning and transformation operations.
pub struct DataProcessor;

impl DataProcessor {
    fn has_column(df: &DataFrame, name: &str) -> bool {
        df.column(name).is_ok()
    }

    fn require_column(df: &DataFrame, name: &str) -> Result<(), ProcessorError> {
        if Self::has_column(df, name) {
            Ok(())
        } else {
            Err(ProcessorError::MissingColumn(name.to_string()))
        }
    }

    /// Append `Net_Migration = Immigration - Emigration` when both exist.
    pub fn add_net_migration(mut df: DataFrame) -> Result<DataFrame, ProcessorError> {
        if !(Self::has_column(&df, IMMIGRATION) && Self::has_column(&df, EMIGRATION)) {
            debug!("Immigration/Emigration not both present, skipping Net_Migration");
            return Ok(df);
        }

        let immigration = column_as_f64(&df, IMMIGRATION)?;
        let emigration = column_as_f64(&df, EMIGRATION)?;
        let net: Vec<Option<f64>> = immigration
            .iter()
            .zip(&emigration)
            .map(|(imm, emi)| Some((*imm)? - (*emi)?))
            .collect();

        df.with_column(Column::new(NET_MIGRATION.into(), net))?;
        Ok(df)
    }

    /// Sum that skips missing values; missing only if every value is.
    pub fn skipna_sum(values: &[Option<f64>]) -> Option<f64> {
        values
            .iter()
            .flatten()
            .fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
    }

    /// Relabel one of two duplicated 2024 rows as 2014.
    ///
    /// The knife-crime source stamps the 2014 row as 2024. When no 2014 row
    /// exists and at least two rows claim 2024, the 2024 row with the
    /// smallest total (first on ties, missing totals ignored) becomes 2014.
    /// This targets that single known defect and guesses from magnitude; it
    /// is not a general repair. Returns the relabelled row index.
    pub fn repair_mislabelled_year(
        years: &mut [Option<i64>],
        totals: &[Option<f64>],
    ) -> Option<usize> {
        if years.contains(&Some(REPAIRED_YEAR)) {
            return None;
        }

        let candidates: Vec<usize> = years
            .iter()
            .enumerate()
            .filter(|(_, year)| **year == Some(MISLABELLED_AS_YEAR))
            .map(|(idx, _)| idx)
            .collect();
        if candidates.len() < 2 {
            return None;
        }

        let mut smallest: Option<(usize, f64)> = None;
        for idx in candidates {
            let Some(total) = totals.get(idx).copied().flatten() else {
                continue;
            };
            match smallest {
                Some((_, best)) if total >= best => {}
                _ => smallest = Some((idx, total)),
            }
        }

        let (idx, _) = smallest?;
        years[idx] = Some(REPAIRED_YEAR);
        Some(idx)
    }

    /// Clean the knife-crime table into `[Year, Knife_Crime_Total]`.
    ///
    /// Categories are summed with skip-missing semantics, the mislabelled
    /// year is repaired, rows missing either field are dropped and the rest
    /// sorted by Year.
    pub fn clean_knife_crime(df: &DataFrame) -> Result<DataFrame, ProcessorError> {
        Self::require_column(df, YEAR_COLUMN)?;
        for category in KNIFE_CATEGORY_COLUMNS {
            Self::require_column(df, category)?;
        }

        let categories = KNIFE_CATEGORY_COLUMNS
            .iter()
            .map(|name| column_as_f64(df, name))
            .collect::<PolarsResult<Vec<_>>>()?;

        let totals: Vec<Option<f64>> = (0..df.height())
            .map(|row| {
                let cells: Vec<Option<f64>> = categories.iter().map(|c| c[row]).collect();
                Self::skipna_sum(&cells)
            })
            .collect();

        let mut years = column_as_i64(df, YEAR_COLUMN)?;
        if let Some(idx) = Self::repair_mislabelled_year(&mut years, &totals) {
            info!(row = idx, "relabelled duplicated {} row as {}", MISLABELLED_AS_YEAR, REPAIRED_YEAR);
        }

        let mut rows: Vec<(i64, f64)> = years
            .iter()
            .zip(&totals)
            .filter_map(|(year, total)| Some(((*year)?, (*total)?)))
            .collect();
        rows.sort_by_key(|(year, _)| *year);

        let dropped = df.height() - rows.len();
        if dropped > 0 {
            debug!(dropped, "dropped knife-crime rows missing Year or total");
        }

        let (out_years, out_totals): (Vec<i64>, Vec<f64>) = rows.into_iter().unzip();
        let cleaned = DataFrame::new(vec![
            Column::new(YEAR_COLUMN.into(), out_years),
            Column::new(KNIFE_CRIME_TOTAL.into(), out_totals),
        ])?;

        Ok(cleaned)
    }

    /// Project the economic table down to `[Year, Emigration]`.
    pub fn emigration_projection(df: &DataFrame) -> Result<DataFrame, ProcessorError> {
        Self::require_column(df, YEAR_COLUMN)?;
        Self::require_column(df, EMIGRATION)?;
        Ok(df.select([YEAR_COLUMN, EMIGRATION])?)
    }

    /// Inner join on Year, sorted ascending by Year.
    pub fn merge_on_year(left: &DataFrame, right: &DataFrame) -> Result<DataFrame, ProcessorError> {
        Self::require_column(left, YEAR_COLUMN)?;
        Self::require_column(right, YEAR_COLUMN)?;

        let merged = left
            .clone()
            .lazy()
            .join(
                right.clone().lazy(),
                [col(YEAR_COLUMN)],
                [col(YEAR_COLUMN)],
                JoinArgs::new(JoinType::Inner),
            )
            .sort(
                [YEAR_COLUMN],
                SortMultipleOptions::default().with_maintain_order(true),
            )
            .collect()?;

        Ok(merged)
    }
}
