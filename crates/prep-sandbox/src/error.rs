//! Error types for candidate expressions.

use thiserror::Error;

/// Why a single candidate expression could not produce a column.
///
/// These never escape the sandbox: [`crate::apply`] turns each one into a
/// `Rejected` or `Failed` outcome for the candidate that raised it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    // === Static checks (Rejected) ===
    /// Expression text contains a forbidden token.
    #[error("expression contains forbidden token '{token}'")]
    Denied { token: String },

    /// Expression text is longer than the configured limit.
    #[error("expression is {len} bytes, limit is {max}")]
    TooLong { len: usize, max: usize },

    /// Expression reads the target column.
    #[error("expression references target column '{column}'")]
    TargetReference { column: String },

    /// Candidate would replace the target column.
    #[error("feature name '{name}' collides with the target column")]
    TargetOverwrite { name: String },

    /// Candidate has no usable column name.
    #[error("feature name is empty")]
    EmptyName,

    // === Parse errors (Failed) ===
    /// Unrecognized character or malformed literal.
    #[error("invalid token at offset {offset}: {message}")]
    Lex { offset: usize, message: String },

    /// Token stream does not match the grammar.
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    /// Nesting exceeds the configured depth.
    #[error("expression nesting exceeds depth {max}")]
    TooDeep { max: usize },

    /// Function or method outside the whitelist.
    #[error("unknown function '{name}'")]
    UnknownFunction { name: String },

    /// Function called with the wrong number of arguments.
    #[error("{function} expects {expected} argument(s), got {actual}")]
    Arity {
        function: &'static str,
        expected: &'static str,
        actual: usize,
    },

    // === Evaluation errors (Failed) ===
    /// Referenced column does not exist.
    #[error("column '{name}' not found")]
    ColumnNotFound { name: String },

    /// Operand types do not fit the operation.
    #[error("type mismatch: {message}")]
    TypeMismatch { message: String },

    /// Expression evaluated to a single value instead of a column.
    #[error("expression evaluates to a scalar, not a column")]
    ScalarResult,

    /// Step budget exhausted.
    #[error("evaluation exceeded the step budget of {max}")]
    StepBudget { max: u64 },

    /// Wall-clock budget exhausted.
    #[error("evaluation exceeded the time budget of {ms} ms")]
    TimeBudget { ms: u64 },
}

impl ExprError {
    /// Static-check failures map to `Rejected`; everything else to `Failed`.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Denied { .. }
                | Self::TooLong { .. }
                | Self::TargetReference { .. }
                | Self::TargetOverwrite { .. }
                | Self::EmptyName
        )
    }

    pub(crate) fn type_mismatch(message: impl Into<String>) -> Self {
        Self::TypeMismatch {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExprError>;
