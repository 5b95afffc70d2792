//! Tree-walking evaluator with a step and time budget.
//!
//! The only thing an expression can reach is the dataset it is evaluated
//! against. Every node charges one step per cell it produces; exceeding
//! either budget aborts evaluation of that expression.

use std::cmp::Ordering;
use std::time::{Duration, Instant};

use chrono::{Datelike, Timelike};
use prep_model::{CellValue, ColumnData, DataType, Dataset, SandboxOptions, parse_datetime};
use prep_transform::stats::median;

use crate::ast::{BinaryOp, CastType, DatePart, Expr, Function, UnaryOp};
use crate::error::{ExprError, Result};
use crate::value::{
    Lane, Value, booleans, column_from_cells, datetimes, numbers, parsed_numbers, texts, width,
    zip,
};

static NULL: Value = Value::Scalar(CellValue::Null);

/// Step and wall-clock limits for a single expression.
#[derive(Debug)]
pub struct Budget {
    max_steps: u64,
    used: u64,
    started: Instant,
    limit: Duration,
}

impl Budget {
    pub fn new(max_steps: u64, time_budget_ms: u64) -> Self {
        Self {
            max_steps,
            used: 0,
            started: Instant::now(),
            limit: Duration::from_millis(time_budget_ms),
        }
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    /// Charges `cells` steps (at least one).
    pub fn charge(&mut self, cells: usize) -> Result<()> {
        self.used = self.used.saturating_add(cells.max(1) as u64);
        if self.used > self.max_steps {
            return Err(ExprError::StepBudget {
                max: self.max_steps,
            });
        }
        if self.started.elapsed() > self.limit {
            return Err(ExprError::TimeBudget {
                ms: self.limit.as_millis() as u64,
            });
        }
        Ok(())
    }
}

/// Evaluates expressions against one dataset.
pub struct Evaluator<'a> {
    dataset: &'a Dataset,
    budget: Budget,
    nulled: usize,
}

impl<'a> Evaluator<'a> {
    pub fn new(dataset: &'a Dataset, options: &SandboxOptions) -> Self {
        Self {
            dataset,
            budget: Budget::new(options.max_steps, options.time_budget_ms),
            nulled: 0,
        }
    }

    /// Cells set to null because an operation produced NaN or infinity.
    pub fn nulled(&self) -> usize {
        self.nulled
    }

    pub fn steps(&self) -> u64 {
        self.budget.used()
    }

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Number(n) => {
                self.budget.charge(1)?;
                Ok(self.finite(Lane::Scalar(Some(*n))).into_value())
            }
            Expr::Text(s) => Ok(Value::Scalar(CellValue::Text(s.clone()))),
            Expr::Boolean(b) => Ok(Value::Scalar(CellValue::Boolean(*b))),
            Expr::Null => Ok(Value::Scalar(CellValue::Null)),
            Expr::Column(name) => {
                let column = self
                    .dataset
                    .column(name)
                    .ok_or_else(|| ExprError::ColumnNotFound { name: name.clone() })?;
                self.budget.charge(column.len())?;
                Ok(Value::Column(column.data().clone()))
            }
            Expr::Unary { op, operand } => {
                let value = self.evaluate(operand)?;
                self.unary(*op, &value)
            }
            Expr::Binary { op, left, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                self.binary(*op, &left, &right)
            }
            Expr::Call { function, args } => {
                let values = args
                    .iter()
                    .map(|arg| self.evaluate(arg))
                    .collect::<Result<Vec<_>>>()?;
                self.call(*function, &values)
            }
        }
    }

    fn finite(&mut self, lane: Lane<f64>) -> Lane<f64> {
        let mut check = |v: Option<f64>| match v {
            Some(x) if !x.is_finite() => {
                self.nulled += 1;
                None
            }
            other => other,
        };
        match lane {
            Lane::Scalar(v) => Lane::Scalar(check(v)),
            Lane::Column(v) => Lane::Column(v.into_iter().map(check).collect()),
        }
    }

    fn unary(&mut self, op: UnaryOp, value: &Value) -> Result<Value> {
        self.budget.charge(value.len().unwrap_or(1))?;
        match op {
            UnaryOp::Neg => Ok(numbers(value)?.map(|x| x.map(|x| -x)).into_value()),
            UnaryOp::Not => Ok(booleans(value)?.map(|b| b.map(|b| !b)).into_value()),
        }
    }

    fn binary(&mut self, op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
        let len = width(&[left, right]);
        self.budget.charge(len.unwrap_or(1))?;
        let either = |t: DataType| left.data_type() == Some(t) || right.data_type() == Some(t);

        match op {
            BinaryOp::Add if either(DataType::Text) => {
                let (a, b) = (texts(left)?, texts(right)?);
                Ok(zip(&a, &b, len, |x, y| Some(x? + &y?)).into_value())
            }
            BinaryOp::Sub if either(DataType::Datetime) => {
                let (a, b) = (datetimes(left)?, datetimes(right)?);
                let days = zip(&a, &b, len, |x, y| {
                    Some((x? - y?).num_seconds() as f64 / 86_400.0)
                });
                Ok(days.into_value())
            }
            BinaryOp::Add
            | BinaryOp::Sub
            | BinaryOp::Mul
            | BinaryOp::Div
            | BinaryOp::FloorDiv
            | BinaryOp::Mod
            | BinaryOp::Pow => {
                let (a, b) = (numbers(left)?, numbers(right)?);
                let out = zip(&a, &b, len, |x, y| Some(arithmetic(op, x?, y?)));
                Ok(self.finite(out).into_value())
            }
            BinaryOp::And | BinaryOp::Or => {
                let (a, b) = (booleans(left)?, booleans(right)?);
                let out = zip(&a, &b, len, |x, y| match (op, x, y) {
                    (BinaryOp::And, Some(false), _) | (BinaryOp::And, _, Some(false)) => {
                        Some(false)
                    }
                    (BinaryOp::Or, Some(true), _) | (BinaryOp::Or, _, Some(true)) => Some(true),
                    (_, Some(x), Some(y)) => Some(if op == BinaryOp::And { x && y } else { x || y }),
                    _ => None,
                });
                Ok(out.into_value())
            }
            _ => {
                let out = if either(DataType::Datetime) {
                    let (a, b) = (datetimes(left)?, datetimes(right)?);
                    zip(&a, &b, len, |x, y| Some(compare(op, x.zip(y).map(|(x, y)| x.cmp(&y)))))
                } else if either(DataType::Text) {
                    let (a, b) = (texts(left)?, texts(right)?);
                    zip(&a, &b, len, |x, y| Some(compare(op, x.zip(y).map(|(x, y)| x.cmp(&y)))))
                } else {
                    let (a, b) = (numbers(left)?, numbers(right)?);
                    zip(&a, &b, len, |x, y| {
                        Some(compare(op, x.zip(y).and_then(|(x, y)| x.partial_cmp(&y))))
                    })
                };
                Ok(out.into_value())
            }
        }
    }

    fn call(&mut self, function: Function, args: &[Value]) -> Result<Value> {
        let refs: Vec<&Value> = args.iter().collect();
        let len = width(&refs);
        self.budget.charge(len.unwrap_or(1))?;
        let arg = |idx: usize| args.get(idx).unwrap_or(&NULL);
        let x = arg(0);

        let value = match function {
            Function::Abs => self.math(x, f64::abs)?,
            Function::Sqrt => self.math(x, f64::sqrt)?,
            Function::Log => self.math(x, f64::ln)?,
            Function::Log1p => self.math(x, f64::ln_1p)?,
            Function::Log2 => self.math(x, f64::log2)?,
            Function::Log10 => self.math(x, f64::log10)?,
            Function::Exp => self.math(x, f64::exp)?,
            Function::Floor => self.math(x, f64::floor)?,
            Function::Ceil => self.math(x, f64::ceil)?,
            Function::Round => {
                let decimals = match arg(1) {
                    Value::Scalar(CellValue::Null) => 0,
                    Value::Scalar(CellValue::Number(d)) if d.fract() == 0.0 => *d as i32,
                    _ => return Err(ExprError::type_mismatch("round decimals must be an integer")),
                };
                let scale = 10f64.powi(decimals);
                self.math(x, |v| (v * scale).round_ties_even() / scale)?
            }
            Function::Pow => self.binary(BinaryOp::Pow, x, arg(1))?,
            Function::Minimum | Function::Maximum => {
                let (a, b) = (numbers(x)?, numbers(arg(1))?);
                let keep_max = function == Function::Maximum;
                zip(&a, &b, len, |x, y| {
                    let (x, y) = (x?, y?);
                    Some(if keep_max { x.max(y) } else { x.min(y) })
                })
                .into_value()
            }
            Function::Clip => {
                let lower = numbers(arg(1))?;
                let upper = numbers(arg(2))?;
                let values = numbers(x)?;
                let floored = zip(&values, &lower, len, |v, lo| match lo {
                    Some(lo) => v.map(|v| v.max(lo)),
                    None => v,
                });
                zip(&floored, &upper, len, |v, hi| match hi {
                    Some(hi) => v.map(|v| v.min(hi)),
                    None => v,
                })
                .into_value()
            }
            Function::Where => {
                let mask = booleans(x)?;
                let (a, b) = (arg(1), arg(2));
                pick(len, |i| {
                    if mask.at(i) == Some(true) {
                        a.cell(i)
                    } else {
                        b.cell(i)
                    }
                })?
            }
            Function::FillNa => {
                let fill = arg(1);
                pick(len, |i| match x.cell(i) {
                    CellValue::Null => fill.cell(i),
                    cell => cell,
                })?
            }
            Function::IsNull | Function::NotNull => {
                let want_null = function == Function::IsNull;
                match x {
                    Value::Scalar(cell) => Value::Scalar(CellValue::Boolean(cell.is_null() == want_null)),
                    Value::Column(data) => Value::Column(ColumnData::Boolean(
                        (0..data.len())
                            .map(|i| Some(data.is_null(i) == want_null))
                            .collect(),
                    )),
                }
            }
            Function::ToDatetime => to_datetime(x)?,
            Function::Cast(cast) => self.cast(cast, x)?,
            Function::DatePart(part) => date_part(part, x)?,
            Function::StrLen => texts(x)?
                .map(|s| s.map(|s| s.chars().count() as f64))
                .into_value(),
            Function::Lower => texts(x)?.map(|s| s.map(|s| s.to_lowercase())).into_value(),
            Function::Upper => texts(x)?.map(|s| s.map(|s| s.to_uppercase())).into_value(),
            Function::Strip => texts(x)?
                .map(|s| s.map(|s| s.trim().to_string()))
                .into_value(),
            Function::Contains => {
                let Value::Scalar(CellValue::Text(pattern)) = arg(1) else {
                    return Err(ExprError::type_mismatch(
                        "str.contains expects a text pattern",
                    ));
                };
                texts(x)?
                    .map(|s| s.map(|s| s.contains(pattern.as_str())))
                    .into_value()
            }
            Function::Mean
            | Function::Median
            | Function::Std
            | Function::Sum
            | Function::Min
            | Function::Max => self.aggregate(function, x)?,
        };
        Ok(value)
    }

    fn math(&mut self, value: &Value, f: impl Fn(f64) -> f64) -> Result<Value> {
        let out = numbers(value)?.map(|v| v.map(&f));
        Ok(self.finite(out).into_value())
    }

    fn aggregate(&mut self, function: Function, value: &Value) -> Result<Value> {
        let values: Vec<f64> = match numbers(value)? {
            Lane::Scalar(v) => v.into_iter().collect(),
            Lane::Column(v) => v.into_iter().flatten().collect(),
        };
        self.budget.charge(values.len())?;
        let n = values.len() as f64;
        let mean = (!values.is_empty()).then(|| values.iter().sum::<f64>() / n);
        let out = match function {
            Function::Sum => Some(values.iter().sum()),
            Function::Mean => mean,
            Function::Median => median(&values),
            Function::Std => mean.filter(|_| values.len() > 1).map(|m| {
                (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
            }),
            Function::Min => values.iter().copied().reduce(f64::min),
            Function::Max => values.iter().copied().reduce(f64::max),
            _ => None,
        };
        Ok(self.finite(Lane::Scalar(out)).into_value())
    }

    fn cast(&mut self, cast: CastType, value: &Value) -> Result<Value> {
        Ok(match cast {
            CastType::Int => self
                .finite(parsed_numbers(value)?.map(|v| v.map(f64::trunc)))
                .into_value(),
            CastType::Float => self.finite(parsed_numbers(value)?).into_value(),
            CastType::Bool => match value.data_type() {
                Some(DataType::Boolean) | None => booleans(value)?.into_value(),
                Some(DataType::Text) => texts(value)?.map(|s| s.map(|s| !s.is_empty())).into_value(),
                _ => numbers(value)?.map(|v| v.map(|v| v != 0.0)).into_value(),
            },
            CastType::Str => match value {
                Value::Scalar(cell) => Value::Scalar(match cell {
                    CellValue::Null => CellValue::Null,
                    cell => CellValue::Text(display(cell)),
                }),
                Value::Column(data) => Value::Column(ColumnData::Text(
                    (0..data.len())
                        .map(|i| match data.get(i) {
                            CellValue::Null => None,
                            cell => Some(display(&cell)),
                        })
                        .collect(),
                )),
            },
        })
    }
}

fn date_part(part: DatePart, value: &Value) -> Result<Value> {
    if part == DatePart::Days {
        return Ok(numbers(value)?.map(|v| v.map(f64::floor)).into_value());
    }
    let out = datetimes(value)?.map(|dt| {
        dt.map(|dt| {
            let n = match part {
                DatePart::Year => dt.year(),
                DatePart::Month => dt.month() as i32,
                DatePart::Day => dt.day() as i32,
                DatePart::Hour => dt.hour() as i32,
                DatePart::Minute => dt.minute() as i32,
                DatePart::Second => dt.second() as i32,
                DatePart::DayOfWeek => dt.weekday().num_days_from_monday() as i32,
                DatePart::DayOfYear => dt.ordinal() as i32,
                DatePart::Quarter => (dt.month0() / 3 + 1) as i32,
                DatePart::Days => 0,
            };
            f64::from(n)
        })
    });
    Ok(out.into_value())
}

/// Python semantics: floor division and modulo follow the divisor's sign.
fn arithmetic(op: BinaryOp, x: f64, y: f64) -> f64 {
    match op {
        BinaryOp::Add => x + y,
        BinaryOp::Sub => x - y,
        BinaryOp::Mul => x * y,
        BinaryOp::Div => x / y,
        BinaryOp::FloorDiv => (x / y).floor(),
        BinaryOp::Mod => x - y * (x / y).floor(),
        BinaryOp::Pow => x.powf(y),
        _ => f64::NAN,
    }
}

/// Comparisons against null are false, except `!=`.
fn compare(op: BinaryOp, ordering: Option<Ordering>) -> bool {
    let Some(ordering) = ordering else {
        return op == BinaryOp::NotEq;
    };
    match op {
        BinaryOp::Eq => ordering == Ordering::Equal,
        BinaryOp::NotEq => ordering != Ordering::Equal,
        BinaryOp::Lt => ordering == Ordering::Less,
        BinaryOp::LtEq => ordering != Ordering::Greater,
        BinaryOp::Gt => ordering == Ordering::Greater,
        BinaryOp::GtEq => ordering != Ordering::Less,
        _ => false,
    }
}

/// Builds a value row by row from cells chosen by `cell_at`.
fn pick(len: Option<usize>, cell_at: impl Fn(usize) -> CellValue) -> Result<Value> {
    match len {
        None => Ok(Value::Scalar(cell_at(0))),
        Some(n) => column_from_cells((0..n).map(cell_at).collect()).map(Value::Column),
    }
}

fn to_datetime(value: &Value) -> Result<Value> {
    match value {
        Value::Scalar(CellValue::Text(s)) => Ok(Value::Scalar(
            parse_datetime(s).map_or(CellValue::Null, CellValue::Datetime),
        )),
        Value::Column(ColumnData::Text(v)) => Ok(Value::Column(ColumnData::Datetime(
            v.iter()
                .map(|s| s.as_deref().and_then(parse_datetime))
                .collect(),
        ))),
        _ => Ok(datetimes(value)?.into_value()),
    }
}

fn display(cell: &CellValue) -> String {
    match cell {
        CellValue::Boolean(true) => "True".to_string(),
        CellValue::Boolean(false) => "False".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use prep_model::Column;

    fn dataset() -> Dataset {
        Dataset::new(vec![
            Column::numeric("a", vec![Some(1.0), Some(-2.0), None, Some(4.0)]),
            Column::from_f64("b", &[2.0, 0.0, 1.0, 4.0]),
            Column::from_strs("s", &["x", "yy", "x", "zzz"]),
        ])
        .unwrap()
    }

    fn eval(source: &str) -> Result<Value> {
        let dataset = dataset();
        let mut evaluator = Evaluator::new(&dataset, &SandboxOptions::default());
        evaluator.evaluate(&parse(source, 64)?)
    }

    fn numeric(values: &[Option<f64>]) -> Value {
        Value::Column(ColumnData::Numeric(values.to_vec()))
    }

    #[test]
    fn test_division_by_zero_becomes_null() {
        let dataset = dataset();
        let mut evaluator = Evaluator::new(&dataset, &SandboxOptions::default());
        let value = evaluator
            .evaluate(&parse("df['a'] / df['b']", 64).unwrap())
            .unwrap();
        assert_eq!(value, numeric(&[Some(0.5), None, None, Some(1.0)]));
        assert_eq!(evaluator.nulled(), 1);
    }

    #[test]
    fn test_floor_division_and_modulo_follow_divisor_sign() {
        assert_eq!(
            eval("df['a'] // 3").unwrap(),
            numeric(&[Some(0.0), Some(-1.0), None, Some(1.0)])
        );
        assert_eq!(
            eval("df['a'] % 3").unwrap(),
            numeric(&[Some(1.0), Some(1.0), None, Some(1.0)])
        );
    }

    #[test]
    fn test_where_and_fillna() {
        assert_eq!(
            eval("np.where(df['b'] > 1, df['b'], 0)").unwrap(),
            numeric(&[Some(2.0), Some(0.0), Some(0.0), Some(4.0)])
        );
        assert_eq!(
            eval("df['a'].fillna(df['a'].median())").unwrap(),
            numeric(&[Some(1.0), Some(-2.0), Some(1.0), Some(4.0)])
        );
    }

    #[test]
    fn test_comparisons_with_null_are_false() {
        assert_eq!(
            eval("df['a'] > 0").unwrap(),
            Value::Column(ColumnData::Boolean(vec![
                Some(true),
                Some(false),
                Some(false),
                Some(true)
            ]))
        );
        assert_eq!(
            eval("(df['s'] == 'x').astype(int)").unwrap(),
            numeric(&[Some(1.0), Some(0.0), Some(1.0), Some(0.0)])
        );
    }

    #[test]
    fn test_string_helpers() {
        assert_eq!(
            eval("df['s'].str.len() + df['s'].str.contains('z')").unwrap(),
            numeric(&[Some(1.0), Some(2.0), Some(1.0), Some(4.0)])
        );
        assert!(matches!(
            eval("df['s'] * 2"),
            Err(ExprError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_aggregates_broadcast() {
        // mean of [1, -2, 4] is 1
        assert_eq!(
            eval("df['b'] - df['a'].mean()").unwrap(),
            numeric(&[Some(1.0), Some(-1.0), Some(0.0), Some(3.0)])
        );
        assert_eq!(
            eval("df['b'].std()").unwrap(),
            Value::Scalar(CellValue::Number((8.75f64 / 3.0).sqrt()))
        );
    }

    #[test]
    fn test_dates() {
        let dataset = Dataset::new(vec![Column::from_strs(
            "joined",
            &["2024-01-15", "2023-12-31", "not a date"],
        )])
        .unwrap();
        let mut evaluator = Evaluator::new(&dataset, &SandboxOptions::default());
        let expr = parse("pd.to_datetime(df['joined']).dt.month", 64).unwrap();
        assert_eq!(
            evaluator.evaluate(&expr).unwrap(),
            numeric(&[Some(1.0), Some(12.0), None])
        );
        let expr = parse(
            "(pd.to_datetime(df['joined']) - pd.to_datetime('2023-12-01')).dt.days",
            64,
        )
        .unwrap();
        assert_eq!(
            evaluator.evaluate(&expr).unwrap(),
            numeric(&[Some(45.0), Some(30.0), None])
        );
    }

    #[test]
    fn test_step_budget() {
        let dataset = dataset();
        let options = SandboxOptions {
            max_steps: 10,
            ..SandboxOptions::default()
        };
        let mut evaluator = Evaluator::new(&dataset, &options);
        let expr = parse("df['a'] + df['b'] + df['a']", 64).unwrap();
        assert!(matches!(
            evaluator.evaluate(&expr),
            Err(ExprError::StepBudget { max: 10 })
        ));
    }

    #[test]
    fn test_missing_column() {
        assert!(matches!(
            eval("df['missing'] + 1"),
            Err(ExprError::ColumnNotFound { name }) if name == "missing"
        ));
    }
}
