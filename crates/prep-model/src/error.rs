//! Error types shared by every pipeline stage.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pipeline stage that produced a value or an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Reading the source file into a dataset.
    Ingest,
    /// Row/column remediation of missing values and outliers.
    Clean,
    /// Redundancy and relevance based column pruning.
    Select,
    /// Requesting candidate features from the suggestion source.
    Suggest,
    /// Validating and evaluating candidate expressions.
    Sandbox,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ingest => "ingest",
            Self::Clean => "clean",
            Self::Select => "select",
            Self::Suggest => "suggest",
            Self::Sandbox => "sandbox",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by dataset construction and by the pipeline stages.
///
/// `EmptyDataset` and `TargetNotFound` are fatal: the orchestrator stops at
/// the stage that raised them. Per-candidate expression problems never show
/// up here, they are reported as [`crate::ExpressionOutcome`] values.
#[derive(Debug, Error)]
pub enum PrepError {
    /// A stage left no rows (or no feature columns) to work with.
    #[error("{stage} stage produced an empty dataset after {step}")]
    EmptyDataset { stage: Stage, step: &'static str },

    /// The target column is absent from the dataset.
    #[error("target column '{target}' not found (required by {stage} stage)")]
    TargetNotFound { target: String, stage: Stage },

    /// Two columns share a name.
    #[error("duplicate column name: {name}")]
    DuplicateColumn { name: String },

    /// A column does not match the dataset row count.
    #[error("column '{name}' has {actual} rows, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// A referenced column does not exist.
    #[error("column '{name}' not found")]
    ColumnNotFound { name: String },

    /// An option value is outside its accepted range.
    #[error("invalid option {option}: {message}")]
    InvalidOption {
        option: &'static str,
        message: String,
    },
}

impl PrepError {
    /// Stage attached to a fatal pipeline error, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::EmptyDataset { stage, .. } | Self::TargetNotFound { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    pub(crate) fn invalid(option: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidOption {
            option,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PrepError>;
