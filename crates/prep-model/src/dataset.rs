//! In-memory tabular dataset.
//!
//! A [`Dataset`] is an ordered list of uniquely named [`Column`]s that share a
//! common row count. Rows are aligned positionally: every row operation
//! ([`Dataset::filter_rows`], [`Dataset::head`]) is applied to all columns at
//! once so a row can never be permuted in one column only.
//!
//! Column order is part of dataset equality. Stages that reorder columns
//! document the order they produce.

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};

/// Logical type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Numeric,
    Text,
    Datetime,
    Boolean,
}

impl DataType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Text => "text",
            Self::Datetime => "datetime",
            Self::Boolean => "boolean",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single cell, detached from its column.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Number(f64),
    Text(String),
    Datetime(NaiveDateTime),
    Boolean(bool),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Number(v) => write!(f, "{}", format_number(*v)),
            Self::Text(s) => f.write_str(s),
            Self::Datetime(dt) => write!(f, "{}", format_datetime(*dt)),
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

/// Formats a number without a trailing `.0` for integral values.
pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        format!("{v}")
    }
}

/// Formats a datetime as a date when the time component is midnight.
pub fn format_datetime(dt: NaiveDateTime) -> String {
    if dt.time() == chrono::NaiveTime::MIN {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y"];

/// Parses a date or datetime in one of the accepted textual formats.
///
/// Date-only values resolve to midnight. Day-first formats are tried before
/// month-first ones, so `03/04/2024` is the 3rd of April.
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATE_FORMATS.iter().find_map(|fmt| {
                chrono::NaiveDate::parse_from_str(text, fmt)
                    .ok()
                    .map(|d| d.and_time(chrono::NaiveTime::MIN))
            })
        })
}

/// Typed storage for a column. `None` marks a null cell.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
    Datetime(Vec<Option<NaiveDateTime>>),
    Boolean(Vec<Option<bool>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(v) => v.len(),
            Self::Text(v) => v.len(),
            Self::Datetime(v) => v.len(),
            Self::Boolean(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Self::Numeric(_) => DataType::Numeric,
            Self::Text(_) => DataType::Text,
            Self::Datetime(_) => DataType::Datetime,
            Self::Boolean(_) => DataType::Boolean,
        }
    }

    pub fn is_null(&self, idx: usize) -> bool {
        match self {
            Self::Numeric(v) => v[idx].is_none(),
            Self::Text(v) => v[idx].is_none(),
            Self::Datetime(v) => v[idx].is_none(),
            Self::Boolean(v) => v[idx].is_none(),
        }
    }

    pub fn null_count(&self) -> usize {
        match self {
            Self::Numeric(v) => v.iter().filter(|x| x.is_none()).count(),
            Self::Text(v) => v.iter().filter(|x| x.is_none()).count(),
            Self::Datetime(v) => v.iter().filter(|x| x.is_none()).count(),
            Self::Boolean(v) => v.iter().filter(|x| x.is_none()).count(),
        }
    }

    /// Returns the cell at `idx`, or [`CellValue::Null`] when out of range.
    pub fn get(&self, idx: usize) -> CellValue {
        let cell = match self {
            Self::Numeric(v) => v.get(idx).copied().flatten().map(CellValue::Number),
            Self::Text(v) => v
                .get(idx)
                .and_then(Option::as_ref)
                .map(|s| CellValue::Text(s.clone())),
            Self::Datetime(v) => v.get(idx).copied().flatten().map(CellValue::Datetime),
            Self::Boolean(v) => v.get(idx).copied().flatten().map(CellValue::Boolean),
        };
        cell.unwrap_or(CellValue::Null)
    }

    /// Keeps the rows whose mask entry is `true`.
    pub fn filter(&self, keep: &[bool]) -> Self {
        fn pick<T: Clone>(values: &[Option<T>], keep: &[bool]) -> Vec<Option<T>> {
            values
                .iter()
                .zip(keep)
                .filter(|(_, k)| **k)
                .map(|(v, _)| v.clone())
                .collect()
        }
        match self {
            Self::Numeric(v) => Self::Numeric(pick(v, keep)),
            Self::Text(v) => Self::Text(pick(v, keep)),
            Self::Datetime(v) => Self::Datetime(pick(v, keep)),
            Self::Boolean(v) => Self::Boolean(pick(v, keep)),
        }
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Self {
        let n = n.min(self.len());
        match self {
            Self::Numeric(v) => Self::Numeric(v[..n].to_vec()),
            Self::Text(v) => Self::Text(v[..n].to_vec()),
            Self::Datetime(v) => Self::Datetime(v[..n].to_vec()),
            Self::Boolean(v) => Self::Boolean(v[..n].to_vec()),
        }
    }

    pub fn as_numeric(&self) -> Option<&[Option<f64>]> {
        match self {
            Self::Numeric(v) => Some(v),
            _ => None,
        }
    }

    /// Numeric view for arithmetic: numbers as-is, booleans as 0/1.
    pub fn to_f64(&self) -> Option<Vec<Option<f64>>> {
        match self {
            Self::Numeric(v) => Some(v.clone()),
            Self::Boolean(v) => Some(
                v.iter()
                    .map(|b| b.map(|b| if b { 1.0 } else { 0.0 }))
                    .collect(),
            ),
            _ => None,
        }
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self::new(name, ColumnData::Numeric(values))
    }

    /// Numeric column without nulls.
    pub fn from_f64(name: impl Into<String>, values: &[f64]) -> Self {
        Self::numeric(name, values.iter().copied().map(Some).collect())
    }

    pub fn text(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self::new(name, ColumnData::Text(values))
    }

    /// Text column without nulls.
    pub fn from_strs(name: impl Into<String>, values: &[&str]) -> Self {
        Self::text(name, values.iter().map(|s| Some((*s).to_string())).collect())
    }

    pub fn boolean(name: impl Into<String>, values: Vec<Option<bool>>) -> Self {
        Self::new(name, ColumnData::Boolean(values))
    }

    pub fn datetime(name: impl Into<String>, values: Vec<Option<NaiveDateTime>>) -> Self {
        Self::new(name, ColumnData::Datetime(values))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn into_data(self) -> ColumnData {
        self.data
    }

    pub fn data_type(&self) -> DataType {
        self.data.data_type()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.data.null_count()
    }
}

/// Ordered collection of equally long, uniquely named columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<Column>,
    height: usize,
}

impl Dataset {
    /// Builds a dataset, checking name uniqueness and row alignment.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let height = columns.first().map_or(0, Column::len);
        let mut seen = BTreeSet::new();
        for column in &columns {
            if !seen.insert(column.name()) {
                return Err(PrepError::DuplicateColumn {
                    name: column.name().to_string(),
                });
            }
            if column.len() != height {
                return Err(PrepError::LengthMismatch {
                    name: column.name().to_string(),
                    expected: height,
                    actual: column.len(),
                });
            }
        }
        Ok(Self { columns, height })
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// True when the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.height == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Number of non-null cells in row `row`.
    pub fn row_non_null_count(&self, row: usize) -> usize {
        self.columns
            .iter()
            .filter(|c| !c.data().is_null(row))
            .count()
    }

    /// Adds a column at the end, or replaces the data of an existing column
    /// with the same name in place. Returns `true` when a column was replaced.
    pub fn upsert_column(&mut self, column: Column) -> Result<bool> {
        if !self.columns.is_empty() && column.len() != self.height {
            return Err(PrepError::LengthMismatch {
                name: column.name().to_string(),
                expected: self.height,
                actual: column.len(),
            });
        }
        if self.columns.is_empty() {
            self.height = column.len();
        }
        match self.column_index(column.name()) {
            Some(idx) => {
                self.columns[idx] = column;
                Ok(true)
            }
            None => {
                self.columns.push(column);
                Ok(false)
            }
        }
    }

    /// Replaces the data of the column at `idx`, keeping its name and position.
    pub fn replace_data(&mut self, idx: usize, data: ColumnData) -> Result<()> {
        let Some(column) = self.columns.get_mut(idx) else {
            return Err(PrepError::ColumnNotFound {
                name: format!("#{idx}"),
            });
        };
        if data.len() != self.height {
            return Err(PrepError::LengthMismatch {
                name: column.name().to_string(),
                expected: self.height,
                actual: data.len(),
            });
        }
        column.data = data;
        Ok(())
    }

    /// Removes the named columns, preserving the order of the rest.
    pub fn drop_columns(mut self, names: &BTreeSet<String>) -> Self {
        self.columns.retain(|c| !names.contains(c.name()));
        if self.columns.is_empty() {
            self.height = 0;
        }
        self
    }

    /// Keeps the rows whose mask entry is `true`, across every column.
    pub fn filter_rows(self, keep: &[bool]) -> Self {
        debug_assert_eq!(keep.len(), self.height);
        let height = keep.iter().filter(|k| **k).count();
        let columns = self
            .columns
            .into_iter()
            .map(|c| Column::new(c.name, c.data.filter(keep)))
            .collect();
        Self { columns, height }
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Self {
        let columns: Vec<Column> = self
            .columns
            .iter()
            .map(|c| Column::new(c.name(), c.data().head(n)))
            .collect();
        let height = n.min(self.height);
        Self { columns, height }
    }

    /// Moves the named column to the end of the column order.
    pub fn move_to_end(mut self, name: &str) -> Result<Self> {
        let idx = self.column_index(name).ok_or_else(|| PrepError::ColumnNotFound {
            name: name.to_string(),
        })?;
        let column = self.columns.remove(idx);
        self.columns.push(column);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number_trims_integral_values() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(-0.125), "-0.125");
    }

    #[test]
    fn test_column_get_out_of_range_is_null() {
        let data = ColumnData::Numeric(vec![Some(1.0)]);
        assert_eq!(data.get(0), CellValue::Number(1.0));
        assert_eq!(data.get(5), CellValue::Null);
    }

    #[test]
    fn test_boolean_to_f64() {
        let data = ColumnData::Boolean(vec![Some(true), None, Some(false)]);
        assert_eq!(data.to_f64(), Some(vec![Some(1.0), None, Some(0.0)]));
        assert!(ColumnData::Text(vec![]).to_f64().is_none());
    }

    #[test]
    fn test_parse_datetime_formats() {
        let date = parse_datetime("2024-04-03").unwrap();
        assert_eq!(format_datetime(date), "2024-04-03");
        assert_eq!(parse_datetime("03/04/2024"), Some(date));
        let stamp = parse_datetime("2024-04-03T10:30:00").unwrap();
        assert_eq!(format_datetime(stamp), "2024-04-03 10:30:00");
        assert!(parse_datetime("next tuesday").is_none());
        assert!(parse_datetime("  ").is_none());
    }
}
