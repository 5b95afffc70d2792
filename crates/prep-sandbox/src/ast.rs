//! Expression tree produced by the parser.

use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::NotEq | Self::Lt | Self::LtEq | Self::Gt | Self::GtEq
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::FloorDiv => "//",
            Self::Mod => "%",
            Self::Pow => "**",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "&",
            Self::Or => "|",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// Target type of `astype(..)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastType {
    Int,
    Float,
    Bool,
    Str,
}

impl CastType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "int" | "int32" | "int64" => Some(Self::Int),
            "float" | "float32" | "float64" => Some(Self::Float),
            "bool" => Some(Self::Bool),
            "str" | "string" | "object" => Some(Self::Str),
            _ => None,
        }
    }
}

/// Component read by a `.dt.<part>` accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePart {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    /// Monday is 0.
    DayOfWeek,
    DayOfYear,
    Quarter,
    /// Whole days of a numeric day count, as produced by datetime subtraction.
    Days,
}

impl DatePart {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "year" => Some(Self::Year),
            "month" => Some(Self::Month),
            "day" => Some(Self::Day),
            "hour" => Some(Self::Hour),
            "minute" => Some(Self::Minute),
            "second" => Some(Self::Second),
            "dayofweek" | "weekday" | "day_of_week" => Some(Self::DayOfWeek),
            "dayofyear" | "day_of_year" => Some(Self::DayOfYear),
            "quarter" => Some(Self::Quarter),
            "days" => Some(Self::Days),
            _ => None,
        }
    }
}

/// Whitelisted helper functions.
///
/// Free functions (`np.log(x)`, `abs(x)`) and methods (`x.abs()`) share this
/// table; a method call passes its receiver as the first argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Abs,
    Sqrt,
    Log,
    Log1p,
    Log2,
    Log10,
    Exp,
    Floor,
    Ceil,
    Round,
    Pow,
    Clip,
    Minimum,
    Maximum,
    Where,
    FillNa,
    IsNull,
    NotNull,
    ToDatetime,
    Cast(CastType),
    DatePart(DatePart),
    StrLen,
    Lower,
    Upper,
    Strip,
    Contains,
    Mean,
    Median,
    Std,
    Sum,
    Min,
    Max,
}

impl Function {
    /// Looks up a function or method by name.
    pub fn from_name(name: &str) -> Option<Self> {
        let function = match name {
            "abs" | "absolute" => Self::Abs,
            "sqrt" => Self::Sqrt,
            "log" => Self::Log,
            "log1p" => Self::Log1p,
            "log2" => Self::Log2,
            "log10" => Self::Log10,
            "exp" => Self::Exp,
            "floor" => Self::Floor,
            "ceil" => Self::Ceil,
            "round" => Self::Round,
            "pow" | "power" => Self::Pow,
            "clip" => Self::Clip,
            "minimum" => Self::Minimum,
            "maximum" => Self::Maximum,
            "where" => Self::Where,
            "fillna" => Self::FillNa,
            "isnull" | "isna" => Self::IsNull,
            "notnull" | "notna" => Self::NotNull,
            "to_datetime" => Self::ToDatetime,
            "mean" => Self::Mean,
            "median" => Self::Median,
            "std" => Self::Std,
            "sum" => Self::Sum,
            "min" => Self::Min,
            "max" => Self::Max,
            _ => return None,
        };
        Some(function)
    }

    /// Looks up a `.str.<name>` accessor method.
    pub fn from_str_accessor(name: &str) -> Option<Self> {
        match name {
            "len" => Some(Self::StrLen),
            "lower" => Some(Self::Lower),
            "upper" => Some(Self::Upper),
            "strip" => Some(Self::Strip),
            "contains" => Some(Self::Contains),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Abs => "abs",
            Self::Sqrt => "sqrt",
            Self::Log => "log",
            Self::Log1p => "log1p",
            Self::Log2 => "log2",
            Self::Log10 => "log10",
            Self::Exp => "exp",
            Self::Floor => "floor",
            Self::Ceil => "ceil",
            Self::Round => "round",
            Self::Pow => "pow",
            Self::Clip => "clip",
            Self::Minimum => "minimum",
            Self::Maximum => "maximum",
            Self::Where => "where",
            Self::FillNa => "fillna",
            Self::IsNull => "isnull",
            Self::NotNull => "notnull",
            Self::ToDatetime => "to_datetime",
            Self::Cast(_) => "astype",
            Self::DatePart(_) => "dt",
            Self::StrLen => "str.len",
            Self::Lower => "str.lower",
            Self::Upper => "str.upper",
            Self::Strip => "str.strip",
            Self::Contains => "str.contains",
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Std => "std",
            Self::Sum => "sum",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    /// Accepted argument counts, receiver included.
    pub fn arity(self) -> (usize, usize) {
        match self {
            Self::Round => (1, 2),
            Self::Pow | Self::Minimum | Self::Maximum | Self::FillNa | Self::Contains => (2, 2),
            Self::Clip | Self::Where => (3, 3),
            Self::Min | Self::Max => (1, 2),
            _ => (1, 1),
        }
    }

    fn arity_text(self) -> &'static str {
        match self.arity() {
            (1, 1) => "1",
            (2, 2) => "2",
            (3, 3) => "3",
            _ => "1 or 2",
        }
    }

    /// Validates the argument count and resolves two-argument `min`/`max`
    /// to their elementwise forms.
    pub fn resolve(self, args: usize) -> Result<Self, crate::ExprError> {
        let (lo, hi) = self.arity();
        if args < lo || args > hi {
            return Err(crate::ExprError::Arity {
                function: self.name(),
                expected: self.arity_text(),
                actual: args,
            });
        }
        Ok(match (self, args) {
            (Self::Min, 2) => Self::Minimum,
            (Self::Max, 2) => Self::Maximum,
            _ => self,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Text(String),
    Boolean(bool),
    Null,
    Column(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        function: Function,
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Names of every column the expression reads.
    pub fn columns(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        self.collect_columns(&mut names);
        names
    }

    fn collect_columns<'a>(&'a self, names: &mut BTreeSet<&'a str>) {
        match self {
            Self::Column(name) => {
                names.insert(name.as_str());
            }
            Self::Unary { operand, .. } => operand.collect_columns(names),
            Self::Binary { left, right, .. } => {
                left.collect_columns(names);
                right.collect_columns(names);
            }
            Self::Call { args, .. } => args.iter().for_each(|a| a.collect_columns(names)),
            Self::Number(_) | Self::Text(_) | Self::Boolean(_) | Self::Null => {}
        }
    }

    /// Nesting depth; a leaf has depth 1.
    pub fn depth(&self) -> usize {
        match self {
            Self::Unary { operand, .. } => 1 + operand.depth(),
            Self::Binary { left, right, .. } => 1 + left.depth().max(right.depth()),
            Self::Call { args, .. } => 1 + args.iter().map(Self::depth).max().unwrap_or(0),
            _ => 1,
        }
    }
}
