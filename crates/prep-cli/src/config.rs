//! Pipeline options from a TOML file and command line overrides.
//!
//! ```toml
//! description = "Apartment listings"
//!
//! [clean]
//! null_row_threshold = 0.6
//!
//! [select]
//! correlation_threshold = 0.9
//!
//! [sandbox]
//! extra_denied = ["rolling"]
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use prep_model::PipelineOptions;

/// Reads pipeline options, falling back to defaults without a file.
pub fn load_options(path: Option<&Path>) -> Result<PipelineOptions> {
    let Some(path) = path else {
        return Ok(PipelineOptions::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let options: PipelineOptions =
        toml::from_str(&content).with_context(|| format!("parse config {}", path.display()))?;
    Ok(options)
}

/// Threshold flags that override the configuration file.
#[derive(Debug, Clone, Default, Args)]
pub struct OptionOverrides {
    /// Minimum fraction of populated cells a row needs to survive.
    #[arg(long, value_name = "RATIO")]
    pub null_row_threshold: Option<f64>,

    /// Numeric columns with fewer distinct values skip outlier removal.
    #[arg(long, value_name = "COUNT")]
    pub rare_category_cutoff: Option<usize>,

    /// IQR multiplier for outlier bounds.
    #[arg(long, value_name = "FACTOR")]
    pub iqr_multiplier: Option<f64>,

    /// Pairwise correlation above which one feature of the pair is dropped.
    #[arg(long, value_name = "RATIO")]
    pub correlation_threshold: Option<f64>,

    /// Dominant value share above which a feature is quasi-constant.
    #[arg(long, value_name = "RATIO")]
    pub quasi_constant_ratio: Option<f64>,

    /// Minimum absolute correlation with a numeric target.
    #[arg(long, value_name = "RATIO")]
    pub relevance_floor: Option<f64>,

    /// Evaluation step budget per candidate expression.
    #[arg(long, value_name = "STEPS")]
    pub max_steps: Option<u64>,

    /// Time budget per candidate expression, in milliseconds.
    #[arg(long, value_name = "MS")]
    pub time_budget_ms: Option<u64>,
}

impl OptionOverrides {
    pub fn apply(&self, options: &mut PipelineOptions) {
        if let Some(v) = self.null_row_threshold {
            options.clean.null_row_threshold = v;
        }
        if let Some(v) = self.rare_category_cutoff {
            options.clean.rare_category_cutoff = v;
        }
        if let Some(v) = self.iqr_multiplier {
            options.clean.iqr_multiplier = v;
        }
        if let Some(v) = self.correlation_threshold {
            options.select.correlation_threshold = v;
        }
        if let Some(v) = self.quasi_constant_ratio {
            options.select.quasi_constant_ratio = v;
        }
        if let Some(v) = self.relevance_floor {
            options.select.relevance_floor = v;
        }
        if let Some(v) = self.max_steps {
            options.sandbox.max_steps = v;
        }
        if let Some(v) = self.time_budget_ms {
            options.sandbox.time_budget_ms = v;
        }
    }
}

/// Loads the file, applies overrides and the description, then validates.
pub fn resolve_options(
    path: Option<&Path>,
    overrides: &OptionOverrides,
    description: Option<&str>,
) -> Result<PipelineOptions> {
    let mut options = load_options(path)?;
    overrides.apply(&mut options);
    if let Some(description) = description {
        options.description = description.to_string();
    }
    options.validate().context("validate options")?;
    Ok(options)
}
