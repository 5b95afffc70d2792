//! Cleaning and feature selection for tabular datasets.
//!
//! - **stats**: on-demand column statistics (quartiles, mode, dominance, correlation)
//! - **clean**: row survival, imputation and IQR outlier removal
//! - **select**: quasi-constant, relevance and redundancy pruning

pub mod clean;
pub mod select;
pub mod stats;

pub use clean::{
    CleanReport, Cleaned, ImputeStrategy, ImputedColumn, OutlierFilter, UNKNOWN_FILL, clean,
    drop_sparse_rows, impute_missing, min_populated_cells, remove_outliers,
};
pub use select::{RedundancyReason, RedundantColumn, SelectReport, Selected, select};
pub use stats::{ColumnStats, CorrelationMatrix, Quartiles, column_stats, describe, pearson};
