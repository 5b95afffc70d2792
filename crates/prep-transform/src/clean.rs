//! Missing-value and outlier remediation.
//!
//! Cleaning runs three steps in order, each on the output of the previous:
//!
//! 1. **Row survival**: drop rows with fewer than
//!    `floor(null_row_threshold * column_count)` populated cells
//! 2. **Imputation**: numeric nulls take the column median, other nulls the
//!    most frequent value; a column with no values at all becomes a text
//!    column of [`UNKNOWN_FILL`]
//! 3. **Outliers**: for numeric columns with at least `rare_category_cutoff`
//!    distinct values, drop rows outside `[Q1 - m*IQR, Q3 + m*IQR]`, one
//!    column at a time over the shrinking row set
//!
//! An empty result at any step is fatal ([`PrepError::EmptyDataset`]).

use prep_model::redact::redact_value;
use prep_model::{
    CellValue, CleanOptions, Column, ColumnData, DataType, Dataset, PrepError, Result, Stage,
};
use serde::Serialize;
use tracing::{debug, info, trace};

use crate::stats::{Quartiles, cardinality, median, mode, non_null};

/// Fill value for columns whose mode is undefined.
pub const UNKNOWN_FILL: &str = "Unknown";

/// How a column's nulls were filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputeStrategy {
    Median,
    Mode,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImputedColumn {
    pub column: String,
    pub strategy: ImputeStrategy,
    pub fill_value: String,
    pub filled: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierFilter {
    pub column: String,
    pub lower: f64,
    pub upper: f64,
    pub rows_dropped: usize,
}

/// What the Cleaner did, for logging and the run report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleanReport {
    pub rows_in: usize,
    pub rows_dropped_sparse: usize,
    pub imputed: Vec<ImputedColumn>,
    pub outlier_filters: Vec<OutlierFilter>,
    pub rows_out: usize,
}

impl CleanReport {
    pub fn rows_dropped_outliers(&self) -> usize {
        self.outlier_filters.iter().map(|f| f.rows_dropped).sum()
    }
}

/// Cleaned dataset plus the report describing how it was produced.
#[derive(Debug, Clone)]
pub struct Cleaned {
    pub dataset: Dataset,
    pub report: CleanReport,
}

/// Runs the three cleaning steps.
pub fn clean(dataset: Dataset, options: &CleanOptions) -> Result<Cleaned> {
    options.validate()?;
    let mut report = CleanReport {
        rows_in: dataset.height(),
        ..CleanReport::default()
    };
    ensure_rows(&dataset, "input")?;

    let (dataset, dropped) = drop_sparse_rows(dataset, options.null_row_threshold);
    report.rows_dropped_sparse = dropped;
    info!(
        rows_dropped = dropped,
        rows = dataset.height(),
        "dropped sparse rows"
    );
    ensure_rows(&dataset, "row survival filter")?;

    let mut dataset = dataset;
    report.imputed = impute_missing(&mut dataset)?;
    info!(columns = report.imputed.len(), "imputed missing values");

    let (dataset, filters) =
        remove_outliers(dataset, options.rare_category_cutoff, options.iqr_multiplier)?;
    report.outlier_filters = filters;
    report.rows_out = dataset.height();
    info!(
        rows_dropped = report.rows_dropped_outliers(),
        rows = report.rows_out,
        "removed outliers"
    );

    Ok(Cleaned { dataset, report })
}

fn ensure_rows(dataset: &Dataset, step: &'static str) -> Result<()> {
    if dataset.is_empty() {
        return Err(PrepError::EmptyDataset {
            stage: Stage::Clean,
            step,
        });
    }
    Ok(())
}

/// Minimum populated cells a row needs to survive.
pub fn min_populated_cells(null_row_threshold: f64, column_count: usize) -> usize {
    (null_row_threshold * column_count as f64).floor() as usize
}

/// Drops rows with fewer populated cells than [`min_populated_cells`].
///
/// Returns the filtered dataset and the number of dropped rows.
pub fn drop_sparse_rows(dataset: Dataset, null_row_threshold: f64) -> (Dataset, usize) {
    let required = min_populated_cells(null_row_threshold, dataset.width());
    let keep: Vec<bool> = (0..dataset.height())
        .map(|row| dataset.row_non_null_count(row) >= required)
        .collect();
    let dropped = keep.iter().filter(|k| !**k).count();
    if dropped == 0 {
        return (dataset, 0);
    }
    (dataset.filter_rows(&keep), dropped)
}

/// Fills every null cell in place.
pub fn impute_missing(dataset: &mut Dataset) -> Result<Vec<ImputedColumn>> {
    let mut imputed = Vec::new();
    for idx in 0..dataset.width() {
        let column = &dataset.columns()[idx];
        let nulls = column.null_count();
        if nulls == 0 {
            continue;
        }
        let name = column.name().to_string();
        let (data, strategy, fill) = fill_column(column);
        debug!(column = %name, filled = nulls, strategy = ?strategy, "imputing column");
        trace!(
            column = %name,
            fill_value = redact_value(&fill.to_string()),
            "imputation value"
        );
        dataset.replace_data(idx, data)?;
        imputed.push(ImputedColumn {
            column: name,
            strategy,
            fill_value: fill.to_string(),
            filled: nulls,
        });
    }
    Ok(imputed)
}

fn fill_column(column: &Column) -> (ColumnData, ImputeStrategy, CellValue) {
    let data = column.data();
    let fill = match data {
        ColumnData::Numeric(values) => {
            median(&non_null(values)).map(|m| (CellValue::Number(m), ImputeStrategy::Median))
        }
        _ => mode(data).map(|m| (m, ImputeStrategy::Mode)),
    };
    match fill {
        Some((value, strategy)) => (fill_nulls(data, &value), strategy, value),
        None => (
            ColumnData::Text(vec![Some(UNKNOWN_FILL.to_string()); data.len()]),
            ImputeStrategy::Fallback,
            CellValue::Text(UNKNOWN_FILL.to_string()),
        ),
    }
}

fn fill_nulls(data: &ColumnData, value: &CellValue) -> ColumnData {
    match (data, value) {
        (ColumnData::Numeric(v), CellValue::Number(fill)) => {
            ColumnData::Numeric(v.iter().map(|x| Some(x.unwrap_or(*fill))).collect())
        }
        (ColumnData::Text(v), CellValue::Text(fill)) => ColumnData::Text(
            v.iter()
                .map(|x| Some(x.clone().unwrap_or_else(|| fill.clone())))
                .collect(),
        ),
        (ColumnData::Datetime(v), CellValue::Datetime(fill)) => {
            ColumnData::Datetime(v.iter().map(|x| Some(x.unwrap_or(*fill))).collect())
        }
        (ColumnData::Boolean(v), CellValue::Boolean(fill)) => {
            ColumnData::Boolean(v.iter().map(|x| Some(x.unwrap_or(*fill))).collect())
        }
        // mode() always returns a value of the column's own type
        _ => data.clone(),
    }
}

/// Applies the IQR filter column by column over the shrinking row set.
pub fn remove_outliers(
    mut dataset: Dataset,
    rare_category_cutoff: usize,
    multiplier: f64,
) -> Result<(Dataset, Vec<OutlierFilter>)> {
    let mut filters = Vec::new();
    let numeric: Vec<String> = dataset
        .columns()
        .iter()
        .filter(|c| c.data_type() == DataType::Numeric)
        .map(|c| c.name().to_string())
        .collect();

    for name in numeric {
        let Some(values) = dataset
            .column(&name)
            .and_then(|c| c.data().as_numeric())
            .map(<[Option<f64>]>::to_vec)
        else {
            continue;
        };
        let distinct = cardinality(&ColumnData::Numeric(values.clone()));
        if distinct < rare_category_cutoff {
            debug!(column = %name, distinct, "skipping low-cardinality column");
            continue;
        }
        let Some(quartiles) = Quartiles::from_values(&non_null(&values)) else {
            continue;
        };
        let (lower, upper) = quartiles.bounds(multiplier);
        let keep: Vec<bool> = values
            .iter()
            .map(|v| v.is_some_and(|v| v >= lower && v <= upper))
            .collect();
        let rows_dropped = keep.iter().filter(|k| !**k).count();
        debug!(column = %name, lower, upper, rows_dropped, "outlier bounds");
        if rows_dropped > 0 {
            dataset = dataset.filter_rows(&keep);
        }
        filters.push(OutlierFilter {
            column: name,
            lower,
            upper,
            rows_dropped,
        });
        ensure_rows(&dataset, "outlier filter")?;
    }
    Ok((dataset, filters))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_populated_cells_floors() {
        assert_eq!(min_populated_cells(0.5, 4), 2);
        assert_eq!(min_populated_cells(0.5, 5), 2);
        assert_eq!(min_populated_cells(0.5, 1), 0);
        assert_eq!(min_populated_cells(1.0, 3), 3);
    }

    #[test]
    fn test_fill_column_fallback_for_all_null() {
        let column = Column::numeric("empty", vec![None, None]);
        let (data, strategy, _) = fill_column(&column);
        assert_eq!(strategy, ImputeStrategy::Fallback);
        assert_eq!(
            data,
            ColumnData::Text(vec![Some("Unknown".into()), Some("Unknown".into())])
        );
    }
}
