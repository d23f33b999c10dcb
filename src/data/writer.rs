//! Derived CSV writer.

use polars::prelude::*;
use std::fs::{self, File};
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum WriterError {
    #[error("IO error writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] PolarsError),
}

/// Write `df` as CSV with a header row and no index column.
///
/// Parent directories are created if absent. The write is not atomic: a
/// failure part-way leaves a partial file behind.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<(), WriterError> {
    let io_err = |source| WriterError::Io {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let mut file = File::create(path).map_err(io_err)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;

    info!(path = %path.display(), rows = df.height(), "wrote CSV");
    Ok(())
}
