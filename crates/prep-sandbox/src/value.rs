//! Runtime values of the expression interpreter.
//!
//! A value is either a single cell or a whole column. Binary operations
//! broadcast a scalar against a column; two scalars produce a scalar.

use chrono::NaiveDateTime;
use prep_model::{CellValue, ColumnData, DataType, parse_datetime};

use crate::error::{ExprError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(CellValue),
    Column(ColumnData),
}

impl Value {
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Self::Scalar(CellValue::Null) => None,
            Self::Scalar(CellValue::Number(_)) => Some(DataType::Numeric),
            Self::Scalar(CellValue::Text(_)) => Some(DataType::Text),
            Self::Scalar(CellValue::Datetime(_)) => Some(DataType::Datetime),
            Self::Scalar(CellValue::Boolean(_)) => Some(DataType::Boolean),
            Self::Column(data) => Some(data.data_type()),
        }
    }

    pub fn len(&self) -> Option<usize> {
        match self {
            Self::Scalar(_) => None,
            Self::Column(data) => Some(data.len()),
        }
    }

    pub fn cell(&self, idx: usize) -> CellValue {
        match self {
            Self::Scalar(cell) => cell.clone(),
            Self::Column(data) => data.get(idx),
        }
    }

    fn describe(&self) -> String {
        match (self, self.data_type()) {
            (_, None) => "null".to_string(),
            (Self::Scalar(_), Some(t)) => format!("{t} value"),
            (Self::Column(_), Some(t)) => format!("{t} column"),
        }
    }
}

/// Row count shared by the column operands, `None` when all are scalars.
pub fn width(values: &[&Value]) -> Option<usize> {
    values.iter().find_map(|v| v.len())
}

fn expected(kind: &str, found: &Value) -> ExprError {
    ExprError::type_mismatch(format!("expected {kind} operand, found {}", found.describe()))
}

/// A value seen as cells of one Rust type.
#[derive(Debug, Clone, PartialEq)]
pub enum Lane<T> {
    Scalar(Option<T>),
    Column(Vec<Option<T>>),
}

impl<T: Clone> Lane<T> {
    pub fn at(&self, idx: usize) -> Option<T> {
        match self {
            Self::Scalar(v) => v.clone(),
            Self::Column(v) => v.get(idx).cloned().flatten(),
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(Option<T>) -> Option<U>) -> Lane<U> {
        match self {
            Self::Scalar(v) => Lane::Scalar(f(v.clone())),
            Self::Column(v) => Lane::Column(v.iter().cloned().map(f).collect()),
        }
    }
}

/// Combines two lanes cell by cell over `len` rows.
pub fn zip<A: Clone, B: Clone, T>(
    a: &Lane<A>,
    b: &Lane<B>,
    len: Option<usize>,
    mut f: impl FnMut(Option<A>, Option<B>) -> Option<T>,
) -> Lane<T> {
    match len {
        None => Lane::Scalar(f(a.at(0), b.at(0))),
        Some(n) => Lane::Column((0..n).map(|i| f(a.at(i), b.at(i))).collect()),
    }
}

/// Cell types a lane can be turned back into.
pub trait Cell: Clone {
    fn scalar(value: Option<Self>) -> CellValue;
    fn column(values: Vec<Option<Self>>) -> ColumnData;
}

impl Cell for f64 {
    fn scalar(value: Option<Self>) -> CellValue {
        value.map_or(CellValue::Null, CellValue::Number)
    }
    fn column(values: Vec<Option<Self>>) -> ColumnData {
        ColumnData::Numeric(values)
    }
}

impl Cell for String {
    fn scalar(value: Option<Self>) -> CellValue {
        value.map_or(CellValue::Null, CellValue::Text)
    }
    fn column(values: Vec<Option<Self>>) -> ColumnData {
        ColumnData::Text(values)
    }
}

impl Cell for bool {
    fn scalar(value: Option<Self>) -> CellValue {
        value.map_or(CellValue::Null, CellValue::Boolean)
    }
    fn column(values: Vec<Option<Self>>) -> ColumnData {
        ColumnData::Boolean(values)
    }
}

impl Cell for NaiveDateTime {
    fn scalar(value: Option<Self>) -> CellValue {
        value.map_or(CellValue::Null, CellValue::Datetime)
    }
    fn column(values: Vec<Option<Self>>) -> ColumnData {
        ColumnData::Datetime(values)
    }
}

impl<T: Cell> Lane<T> {
    pub fn into_value(self) -> Value {
        match self {
            Self::Scalar(v) => Value::Scalar(T::scalar(v)),
            Self::Column(v) => Value::Column(T::column(v)),
        }
    }
}

fn bool_to_f64(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

/// Numbers, with booleans as 0/1.
pub fn numbers(value: &Value) -> Result<Lane<f64>> {
    match value {
        Value::Scalar(CellValue::Null) => Ok(Lane::Scalar(None)),
        Value::Scalar(CellValue::Number(n)) => Ok(Lane::Scalar(Some(*n))),
        Value::Scalar(CellValue::Boolean(b)) => Ok(Lane::Scalar(Some(bool_to_f64(*b)))),
        Value::Column(data) => data
            .to_f64()
            .map(Lane::Column)
            .ok_or_else(|| expected("a numeric", value)),
        Value::Scalar(_) => Err(expected("a numeric", value)),
    }
}

/// Numbers, additionally parsing text cells; unparseable text becomes null.
pub fn parsed_numbers(value: &Value) -> Result<Lane<f64>> {
    match value {
        Value::Scalar(CellValue::Text(s)) => Ok(Lane::Scalar(s.trim().parse().ok())),
        Value::Column(ColumnData::Text(v)) => Ok(Lane::Column(
            v.iter()
                .map(|s| s.as_deref().and_then(|s| s.trim().parse().ok()))
                .collect(),
        )),
        _ => numbers(value),
    }
}

pub fn texts(value: &Value) -> Result<Lane<String>> {
    match value {
        Value::Scalar(CellValue::Null) => Ok(Lane::Scalar(None)),
        Value::Scalar(CellValue::Text(s)) => Ok(Lane::Scalar(Some(s.clone()))),
        Value::Column(ColumnData::Text(v)) => Ok(Lane::Column(v.clone())),
        _ => Err(expected("a text", value)),
    }
}

pub fn booleans(value: &Value) -> Result<Lane<bool>> {
    match value {
        Value::Scalar(CellValue::Null) => Ok(Lane::Scalar(None)),
        Value::Scalar(CellValue::Boolean(b)) => Ok(Lane::Scalar(Some(*b))),
        Value::Column(ColumnData::Boolean(v)) => Ok(Lane::Column(v.clone())),
        _ => Err(expected("a boolean", value)),
    }
}

/// Datetimes; a text scalar is parsed so columns compare against literals.
pub fn datetimes(value: &Value) -> Result<Lane<NaiveDateTime>> {
    match value {
        Value::Scalar(CellValue::Null) => Ok(Lane::Scalar(None)),
        Value::Scalar(CellValue::Datetime(dt)) => Ok(Lane::Scalar(Some(*dt))),
        Value::Scalar(CellValue::Text(s)) => parse_datetime(s)
            .map(|dt| Lane::Scalar(Some(dt)))
            .ok_or_else(|| ExprError::type_mismatch(format!("cannot read '{s}' as a date"))),
        Value::Column(ColumnData::Datetime(v)) => Ok(Lane::Column(v.clone())),
        _ => Err(expected("a datetime", value)),
    }
}

/// Builds a column from per-row cells of possibly mixed origin.
///
/// Numbers and booleans mix as numbers; any other mix is a type error. A
/// column of nulls only is numeric.
pub fn column_from_cells(cells: Vec<CellValue>) -> Result<ColumnData> {
    let has = |t: fn(&CellValue) -> bool| cells.iter().any(t);
    let mixed = || ExprError::type_mismatch("branches produce incompatible types");

    if has(|c| matches!(c, CellValue::Number(_))) || cells.iter().all(CellValue::is_null) {
        return cells
            .into_iter()
            .map(|c| match c {
                CellValue::Null => Ok(None),
                CellValue::Number(n) => Ok(Some(n)),
                CellValue::Boolean(b) => Ok(Some(bool_to_f64(b))),
                _ => Err(mixed()),
            })
            .collect::<Result<_>>()
            .map(ColumnData::Numeric);
    }
    if has(|c| matches!(c, CellValue::Text(_))) {
        return cells
            .into_iter()
            .map(|c| match c {
                CellValue::Null => Ok(None),
                CellValue::Text(s) => Ok(Some(s)),
                _ => Err(mixed()),
            })
            .collect::<Result<_>>()
            .map(ColumnData::Text);
    }
    if has(|c| matches!(c, CellValue::Datetime(_))) {
        return cells
            .into_iter()
            .map(|c| match c {
                CellValue::Null => Ok(None),
                CellValue::Datetime(dt) => Ok(Some(dt)),
                _ => Err(mixed()),
            })
            .collect::<Result<_>>()
            .map(ColumnData::Datetime);
    }
    Ok(ColumnData::Boolean(
        cells
            .into_iter()
            .map(|c| match c {
                CellValue::Boolean(b) => Some(b),
                _ => None,
            })
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_broadcasts_against_column() {
        let column = Lane::Column(vec![Some(1.0), None, Some(3.0)]);
        let scalar = Lane::Scalar(Some(10.0));
        let out = zip(&column, &scalar, Some(3), |a, b| Some(a? + b?));
        assert_eq!(out, Lane::Column(vec![Some(11.0), None, Some(13.0)]));
    }

    #[test]
    fn test_booleans_are_numbers() {
        let value = Value::Column(ColumnData::Boolean(vec![Some(true), None]));
        assert_eq!(numbers(&value).unwrap(), Lane::Column(vec![Some(1.0), None]));
        let text = Value::Column(ColumnData::Text(vec![Some("a".into())]));
        assert!(matches!(numbers(&text), Err(ExprError::TypeMismatch { .. })));
    }

    #[test]
    fn test_column_from_mixed_cells() {
        let cells = vec![CellValue::Number(1.0), CellValue::Boolean(true), CellValue::Null];
        assert_eq!(
            column_from_cells(cells).unwrap(),
            ColumnData::Numeric(vec![Some(1.0), Some(1.0), None])
        );
        let bad = vec![CellValue::Number(1.0), CellValue::Text("x".into())];
        assert!(column_from_cells(bad).is_err());
    }
}
