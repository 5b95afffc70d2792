//! Configuration options for the preparation pipeline.
//!
//! Every options struct deserializes with per-field defaults, so a TOML file
//! only needs to name the values it changes.

use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};

/// Options for the Cleaner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanOptions {
    /// Minimum fraction of populated cells a row needs to survive.
    pub null_row_threshold: f64,
    /// Numeric columns with fewer distinct values are treated as encoded
    /// categories and skipped by the outlier filter.
    pub rare_category_cutoff: usize,
    /// IQR multiplier for the outlier bounds.
    pub iqr_multiplier: f64,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            null_row_threshold: 0.5,
            rare_category_cutoff: 10,
            iqr_multiplier: 1.5,
        }
    }
}

impl CleanOptions {
    pub fn validate(&self) -> Result<()> {
        check_ratio("clean.null_row_threshold", self.null_row_threshold)?;
        if !(self.iqr_multiplier.is_finite() && self.iqr_multiplier >= 0.0) {
            return Err(PrepError::invalid(
                "clean.iqr_multiplier",
                format!("expected a non-negative number, got {}", self.iqr_multiplier),
            ));
        }
        Ok(())
    }
}

/// Options for the Selector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectOptions {
    /// Pairs with an absolute correlation strictly above this are redundant.
    pub correlation_threshold: f64,
    /// Columns whose dominant value share exceeds this are quasi-constant.
    pub quasi_constant_ratio: f64,
    /// Minimum absolute correlation with a numeric target.
    pub relevance_floor: f64,
}

impl Default for SelectOptions {
    fn default() -> Self {
        Self {
            correlation_threshold: 0.95,
            quasi_constant_ratio: 0.99,
            relevance_floor: 0.01,
        }
    }
}

impl SelectOptions {
    pub fn validate(&self) -> Result<()> {
        check_ratio("select.correlation_threshold", self.correlation_threshold)?;
        check_ratio("select.quasi_constant_ratio", self.quasi_constant_ratio)?;
        check_ratio("select.relevance_floor", self.relevance_floor)
    }
}

/// Limits and static checks for the expression sandbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxOptions {
    /// Evaluation budget in cell operations for one expression.
    pub max_steps: u64,
    /// Wall-clock budget for one expression, in milliseconds.
    pub time_budget_ms: u64,
    /// Longest accepted expression text, in bytes.
    pub max_expression_len: usize,
    /// Deepest accepted expression nesting.
    pub max_depth: usize,
    /// Forbidden substrings checked in addition to the built-in list.
    pub extra_denied: Vec<String>,
}

impl Default for SandboxOptions {
    fn default() -> Self {
        Self {
            max_steps: 50_000_000,
            time_budget_ms: 5_000,
            max_expression_len: 4_096,
            max_depth: 64,
            extra_denied: Vec::new(),
        }
    }
}

impl SandboxOptions {
    pub fn validate(&self) -> Result<()> {
        if self.max_steps == 0 {
            return Err(PrepError::invalid("sandbox.max_steps", "must be positive"));
        }
        if self.time_budget_ms == 0 {
            return Err(PrepError::invalid(
                "sandbox.time_budget_ms",
                "must be positive",
            ));
        }
        if self.max_expression_len == 0 {
            return Err(PrepError::invalid(
                "sandbox.max_expression_len",
                "must be positive",
            ));
        }
        if self.max_depth == 0 {
            return Err(PrepError::invalid("sandbox.max_depth", "must be positive"));
        }
        Ok(())
    }
}

/// Options for a whole pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    pub clean: CleanOptions,
    pub select: SelectOptions,
    pub sandbox: SandboxOptions,
    /// Free-text dataset description handed to the suggestion source.
    pub description: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            clean: CleanOptions::default(),
            select: SelectOptions::default(),
            sandbox: SandboxOptions::default(),
            description: "Dataset for machine learning".to_string(),
        }
    }
}

impl PipelineOptions {
    pub fn validate(&self) -> Result<()> {
        self.clean.validate()?;
        self.select.validate()?;
        self.sandbox.validate()
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

fn check_ratio(option: &'static str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(PrepError::invalid(
            option,
            format!("expected a value in [0, 1], got {value}"),
        ))
    }
}
