//! Error types for dataset ingestion.

use std::path::PathBuf;

use prep_model::PrepError;
use thiserror::Error;

/// Errors that can occur while loading or writing a dataset file.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Input file not found.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File exceeds the size limit.
    #[error("file {path} is {size} bytes, larger than the {max_size} byte limit")]
    FileTooLarge {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },

    /// File extension is not a supported tabular format.
    #[error("unsupported file format '{extension}' for {path}; expected .csv")]
    UnsupportedFormat { path: PathBuf, extension: String },

    // === CSV Parsing Errors ===
    /// Failed to parse CSV with Polars.
    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// CSV file is empty.
    #[error("CSV file is empty: {path}")]
    EmptyCsv { path: PathBuf },

    /// Header row present but no data rows.
    #[error("CSV file has a header but no rows: {path}")]
    NoRows { path: PathBuf },

    /// Header row names no columns.
    #[error("no columns found in {path}")]
    NoColumns { path: PathBuf },

    /// A header cell is blank.
    #[error("column {index} in {path} has an empty name")]
    EmptyColumnName { path: PathBuf, index: usize },

    // === Conversion Errors ===
    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },

    /// Loaded columns do not form a valid dataset.
    #[error(transparent)]
    Dataset(#[from] PrepError),

    // === Output Errors ===
    /// Failed to write the output file.
    #[error("failed to write {path}: {message}")]
    Write { path: PathBuf, message: String },
}

impl From<polars::prelude::PolarsError> for IngestError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::FileNotFound {
            path: PathBuf::from("/path/to/file.csv"),
        };
        assert_eq!(err.to_string(), "file not found: /path/to/file.csv");

        let err = IngestError::UnsupportedFormat {
            path: PathBuf::from("data.xlsx"),
            extension: "xlsx".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unsupported file format 'xlsx' for data.xlsx; expected .csv"
        );
    }

    #[test]
    fn test_error_from_polars() {
        let polars_err = polars::prelude::PolarsError::ColumnNotFound("test".into());
        let ingest_err: IngestError = polars_err.into();
        assert!(matches!(ingest_err, IngestError::DataFrame { .. }));
    }

    #[test]
    fn test_error_from_dataset() {
        let err: IngestError = PrepError::DuplicateColumn {
            name: "age".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "duplicate column name: age");
    }
}
