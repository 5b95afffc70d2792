//! Data model for the tabular preparation pipeline.
//!
//! - **dataset**: [`Dataset`], [`Column`] and typed column storage
//! - **feature**: [`FeatureCandidate`] requests and [`ExpressionOutcome`] audit records
//! - **options**: per-stage options with serde defaults
//! - **error**: [`PrepError`] and the [`Stage`] that raised it
//! - **redact**: switch controlling whether cell values reach the logs

pub mod dataset;
pub mod error;
pub mod feature;
pub mod options;
pub mod redact;

pub use dataset::{
    CellValue, Column, ColumnData, DataType, Dataset, format_datetime, format_number,
    parse_datetime,
};
pub use error::{PrepError, Result, Stage};
pub use feature::{DEFAULT_FEATURE_NAME, ExpressionOutcome, FeatureCandidate, OutcomeStatus};
pub use options::{CleanOptions, PipelineOptions, SandboxOptions, SelectOptions};
