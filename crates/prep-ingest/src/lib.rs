//! Dataset ingestion utilities.
//!
//! Loads tabular source files into a [`prep_model::Dataset`] and writes
//! prepared datasets back out.
//!
//! # Features
//!
//! - **CSV Loading**: polars reader with header row and schema inference,
//!   UTF-8 with a Latin-1 fallback
//! - **Date Detection**: text columns whose leading values are dates become
//!   datetime columns
//! - **CSV Export**: write an augmented dataset for downstream training
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use prep_ingest::{read_dataset, write_dataset};
//!
//! let dataset = read_dataset(Path::new("housing.csv"))?;
//! write_dataset(&dataset, Path::new("housing_prepared.csv"))?;
//! ```

mod error;
mod reader;
mod writer;

// === Error Types ===
pub use error::{IngestError, Result};

// === CSV Reading ===
pub use reader::{
    DATE_SAMPLE_SIZE, MAX_CSV_FILE_SIZE, check_file_size_with_limit, check_format,
    convert_column, detect_dates, frame_to_dataset, read_csv_frame, read_dataset,
    validate_frame_shape,
};

// === CSV Writing ===
pub use writer::write_dataset;
