//! Column statistics computed on demand.
//!
//! Nothing here is cached: every stage recomputes what it needs from the
//! dataset it owns.

use std::collections::BTreeMap;

use prep_model::{CellValue, Column, ColumnData, DataType, Dataset};
use serde::Serialize;

/// Non-null values of a numeric column.
pub fn non_null(values: &[Option<f64>]) -> Vec<f64> {
    values.iter().flatten().copied().collect()
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Quantile with linear interpolation between closest ranks.
///
/// `sorted` must be ascending. Returns `None` for an empty slice.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    quantile_sorted(&sorted(values), q)
}

pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// First quartile, median and third quartile of a numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quartiles {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
}

impl Quartiles {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let sorted = sorted(values);
        Some(Self {
            q1: quantile_sorted(&sorted, 0.25)?,
            median: quantile_sorted(&sorted, 0.5)?,
            q3: quantile_sorted(&sorted, 0.75)?,
        })
    }

    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    /// Inclusive outlier bounds `[Q1 - m*IQR, Q3 + m*IQR]`.
    pub fn bounds(&self, multiplier: f64) -> (f64, f64) {
        let iqr = self.iqr();
        (self.q1 - multiplier * iqr, self.q3 + multiplier * iqr)
    }
}

fn count_sorted<K: Ord>(values: impl Iterator<Item = K>) -> BTreeMap<K, usize> {
    let mut counts = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    counts
}

/// Distinct non-null values with their counts, most frequent first.
///
/// Ties keep ascending value order, so the first entry is the smallest of
/// the most frequent values.
pub fn value_counts(data: &ColumnData) -> Vec<(CellValue, usize)> {
    let mut counts: Vec<(CellValue, usize)> = match data {
        ColumnData::Numeric(values) => {
            // -0.0 and 0.0 are the same value
            let normalized = values
                .iter()
                .flatten()
                .map(|v| if *v == 0.0 { 0.0 } else { *v });
            let mut ordered: Vec<f64> = normalized.collect();
            ordered.sort_by(f64::total_cmp);
            let mut runs: Vec<(CellValue, usize)> = Vec::new();
            for v in ordered {
                if let Some((CellValue::Number(last), n)) = runs.last_mut()
                    && *last == v
                {
                    *n += 1;
                    continue;
                }
                runs.push((CellValue::Number(v), 1));
            }
            runs
        }
        ColumnData::Text(values) => count_sorted(values.iter().flatten().map(String::as_str))
            .into_iter()
            .map(|(v, n)| (CellValue::Text(v.to_string()), n))
            .collect(),
        ColumnData::Datetime(values) => count_sorted(values.iter().flatten().copied())
            .into_iter()
            .map(|(v, n)| (CellValue::Datetime(v), n))
            .collect(),
        ColumnData::Boolean(values) => count_sorted(values.iter().flatten().copied())
            .into_iter()
            .map(|(v, n)| (CellValue::Boolean(v), n))
            .collect(),
    };
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Most frequent non-null value, or `None` when the column is all null.
pub fn mode(data: &ColumnData) -> Option<CellValue> {
    value_counts(data).into_iter().next().map(|(v, _)| v)
}

/// Number of distinct non-null values.
pub fn cardinality(data: &ColumnData) -> usize {
    value_counts(data).len()
}

/// Share of all rows taken by the most frequent value.
///
/// Nulls count as one value of their own, so an all-null column has a
/// dominant ratio of 1.
pub fn dominant_ratio(data: &ColumnData) -> f64 {
    let rows = data.len();
    if rows == 0 {
        return 0.0;
    }
    let top = value_counts(data).first().map_or(0, |(_, n)| *n);
    let top = top.max(data.null_count());
    top as f64 / rows as f64
}

/// Pearson correlation over the rows where both values are present.
///
/// Returns `None` with fewer than two complete pairs or when either side
/// has zero variance.
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x <= f64::EPSILON * n || var_y <= f64::EPSILON * n {
        return None;
    }
    let r = cov / (var_x.sqrt() * var_y.sqrt());
    Some(r.clamp(-1.0, 1.0))
}

/// Absolute pairwise correlations over a fixed list of numeric columns.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    names: Vec<String>,
    values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    /// Computes the upper triangle and mirrors it.
    pub fn compute(columns: &[(&str, &[Option<f64>])]) -> Self {
        let k = columns.len();
        let mut values = vec![vec![None; k]; k];
        for i in 0..k {
            values[i][i] = Some(1.0);
            for j in (i + 1)..k {
                let r = pearson(columns[i].1, columns[j].1).map(f64::abs);
                values[i][j] = r;
                values[j][i] = r;
            }
        }
        Self {
            names: columns.iter().map(|(n, _)| (*n).to_string()).collect(),
            values,
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.values.get(i).and_then(|row| row.get(j)).copied().flatten()
    }

    /// Index pairs `(i, j)` with `i < j` in column order whose correlation
    /// is strictly above `threshold`.
    pub fn pairs_above(&self, threshold: f64) -> Vec<(usize, usize, f64)> {
        let mut pairs = Vec::new();
        for i in 0..self.names.len() {
            for j in (i + 1)..self.names.len() {
                if let Some(r) = self.get(i, j)
                    && r > threshold
                {
                    pairs.push((i, j, r));
                }
            }
        }
        pairs
    }
}

/// Summary statistics for one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    pub name: String,
    pub data_type: DataType,
    pub null_count: usize,
    pub cardinality: usize,
    pub dominant_ratio: f64,
    pub quartiles: Option<Quartiles>,
}

pub fn column_stats(column: &Column) -> ColumnStats {
    let data = column.data();
    let quartiles = data
        .as_numeric()
        .and_then(|values| Quartiles::from_values(&non_null(values)));
    ColumnStats {
        name: column.name().to_string(),
        data_type: column.data_type(),
        null_count: data.null_count(),
        cardinality: cardinality(data),
        dominant_ratio: dominant_ratio(data),
        quartiles,
    }
}

/// Statistics for every column, in column order.
pub fn describe(dataset: &Dataset) -> Vec<ColumnStats> {
    dataset.columns().iter().map(column_stats).collect()
}
