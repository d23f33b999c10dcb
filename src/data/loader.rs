//! CSV Data Loader Module
//! Handles CSV file loading, header cleanup and numeric coercion using Polars.

use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Key column shared by every observation table.
pub const YEAR_COLUMN: &str = "Year";

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("CSV file not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Failed to parse CSV {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("No data loaded")]
    NoData,
}

/// Parse a raw cell as a number. Blank, unparsable and NaN cells are missing.
pub fn coerce_numeric(raw: Option<&str>) -> Option<f64> {
    let text = raw?.trim();
    if text.is_empty() {
        return None;
    }
    text.parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Parse a raw cell as an integral year ("2014" and "2014.0" both work).
pub fn coerce_year(raw: Option<&str>) -> Option<i64> {
    let value = coerce_numeric(raw)?;
    if value.is_finite() && value.fract() == 0.0 {
        Some(value as i64)
    } else {
        None
    }
}

/// Decode a column as nullable floats.
pub fn column_as_f64(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    let values = column.as_materialized_series().f64()?.into_iter().collect();
    Ok(values)
}

/// Decode a column as nullable integers.
pub fn column_as_i64(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<i64>>> {
    let column = df.column(name)?.cast(&DataType::Int64)?;
    let values = column.as_materialized_series().i64()?.into_iter().collect();
    Ok(values)
}

/// Handles CSV file loading with Polars.
pub struct DataLoader {
    df: Option<DataFrame>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self { df: None }
    }

    /// Load a CSV file as an observation table.
    ///
    /// Every cell is read as text first so that coercion is decided here,
    /// not by schema inference: `Year` becomes nullable `Int64`, every other
    /// column nullable `Float64`.
    pub fn load_csv(&mut self, file_path: &Path) -> Result<&DataFrame, LoaderError> {
        if !file_path.exists() {
            return Err(LoaderError::FileNotFound(file_path.to_path_buf()));
        }

        let raw = LazyCsvReader::new(file_path)
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .finish()
            .and_then(|lf| lf.collect())
            .map_err(|source| LoaderError::Parse {
                path: file_path.to_path_buf(),
                source,
            })?;

        let df = Self::coerce_table(&raw)?;
        info!(
            path = %file_path.display(),
            rows = df.height(),
            columns = df.width(),
            "loaded CSV"
        );

        self.df = Some(df);
        self.df.as_ref().ok_or(LoaderError::NoData)
    }

    /// Trim header names and coerce each text column to its numeric type.
    fn coerce_table(raw: &DataFrame) -> Result<DataFrame, LoaderError> {
        let mut columns = Vec::with_capacity(raw.width());

        for column in raw.get_columns() {
            let name = column.name().trim().to_string();
            let text = column.cast(&DataType::String)?;
            let cells = text.as_materialized_series().str()?;

            let coerced = if name == YEAR_COLUMN {
                let years: Vec<Option<i64>> = cells.into_iter().map(coerce_year).collect();
                Column::new(name.into(), years)
            } else {
                let values: Vec<Option<f64>> = cells.into_iter().map(coerce_numeric).collect();
                let coerced_nulls = cells
                    .into_iter()
                    .zip(&values)
                    .filter(|(raw, value)| raw.is_some() && value.is_none())
                    .count();
                if coerced_nulls > 0 {
                    debug!(column = %name, coerced_nulls, "non-numeric cells set to missing");
                }
                Column::new(name.into(), values)
            };
            columns.push(coerced);
        }

        Ok(DataFrame::new(columns)?)
    }

    /// Take ownership of the loaded DataFrame.
    pub fn into_dataframe(self) -> Result<DataFrame, LoaderError> {
        self.df.ok_or(LoaderError::NoData)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn coerce_numeric_keeps_zero_distinct_from_missing() {
        assert_eq!(coerce_numeric(Some("0")), Some(0.0));
        assert_eq!(coerce_numeric(Some(" 12.5 ")), Some(12.5));
        assert_eq!(coerce_numeric(Some("")), None);
        assert_eq!(coerce_numeric(Some("n/a")), None);
        assert_eq!(coerce_numeric(Some("1,234")), None);
        assert_eq!(coerce_numeric(Some("NaN")), None);
        assert_eq!(coerce_numeric(None), None);
    }

    #[test]
    fn coerce_year_accepts_integral_values_only() {
        assert_eq!(coerce_year(Some("2014")), Some(2014));
        assert_eq!(coerce_year(Some("2014.0")), Some(2014));
        assert_eq!(coerce_year(Some("2014.5")), None);
        assert_eq!(coerce_year(Some("2013/14")), None);
    }

    #[test]
    fn missing_file_is_reported_as_not_found() {
        let mut loader = DataLoader::new();
        let err = loader
            .load_csv(Path::new("definitely/not/here.csv"))
            .unwrap_err();
        assert!(matches!(err, LoaderError::FileNotFound(_)));
        assert!(matches!(loader.into_dataframe(), Err(LoaderError::NoData)));
    }

    #[test]
    fn load_trims_headers_and_coerces_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("obs.csv");
        fs::write(&path, " Year , GDP ,Notes\n2011,1.5,abc\n2012,oops,\n").unwrap();

        let mut loader = DataLoader::new();
        let df = loader.load_csv(&path).unwrap();
        let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["Year", "GDP", "Notes"]);
        assert_eq!(df.height(), 2);

        let df = loader.into_dataframe().unwrap();
        assert_eq!(df.column("Year").unwrap().dtype(), &DataType::Int64);
        assert_eq!(column_as_i64(&df, "Year").unwrap(), vec![Some(2011), Some(2012)]);
        assert_eq!(column_as_f64(&df, "GDP").unwrap(), vec![Some(1.5), None]);
        assert_eq!(column_as_f64(&df, "Notes").unwrap(), vec![None, None]);
    }

    #[test]
    fn ragged_rows_are_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ragged.csv");
        fs::write(&path, "Year,GDP\n2011,1.5\n2012,2.0,extra,cells\n").unwrap();

        let err = DataLoader::new().load_csv(&path).unwrap_err();
        assert!(matches!(err, LoaderError::Parse { .. }));
    }

    #[test]
    fn invalid_utf8_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("binary.csv");
        fs::write(&path, b"Year,GDP\n2011,\xff\xfe\xfd\n").unwrap();

        let err = DataLoader::new().load_csv(&path).unwrap_err();
        assert!(matches!(err, LoaderError::Parse { .. }));
    }

    #[test]
    fn empty_loader_has_no_data() {
        let loader = DataLoader::default();
        assert!(matches!(loader.into_dataframe(), Err(LoaderError::NoData)));
    }
}
