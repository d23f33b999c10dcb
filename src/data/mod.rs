//! Data module - CSV loading, cleaning and persistence

mod loader;
mod processor;
mod writer;

pub use loader::{
    coerce_numeric, coerce_year, column_as_f64, column_as_i64, DataLoader, LoaderError,
    YEAR_COLUMN,
};
pub use processor::{
    DataProcessor, ProcessorError, EMIGRATION, IMMIGRATION, KNIFE_CATEGORY_COLUMNS,
    KNIFE_CRIME_TOTAL, MISLABELLED_AS_YEAR, NET_MIGRATION, REPAIRED_YEAR,
};
pub use writer::{write_csv, WriterError};
