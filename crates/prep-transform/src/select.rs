//! Redundancy and relevance based column pruning.
//!
//! Passes over the non-target columns, cheapest first:
//!
//! 1. **Quasi-constant**: drop columns whose dominant value share exceeds
//!    `quasi_constant_ratio`
//! 2. **Relevance** (numeric target only): drop numeric columns whose absolute
//!    correlation with the target is below `relevance_floor`
//! 3. **Redundancy**: for each numeric pair `(A, B)`, `A` before `B`, with
//!    absolute correlation above `correlation_threshold`, mark the one with the
//!    lower target correlation (`B` on ties or when a score is missing). All
//!    marks are decided against the full matrix before anything is dropped.
//! 4. **Reassembly**: surviving features in their original order, then the
//!    target column.

use std::collections::{BTreeMap, BTreeSet};

use prep_model::{Dataset, PrepError, Result, SelectOptions, Stage};
use serde::Serialize;
use tracing::{debug, info};

use crate::stats::{CorrelationMatrix, dominant_ratio, pearson};

/// Why one column of a redundant pair was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RedundancyReason {
    /// Its correlation with the target was lower than its partner's.
    LowerTargetCorrelation,
    /// Target scores were equal or unavailable; the later column goes.
    LaterColumn,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RedundantColumn {
    pub column: String,
    pub partner: String,
    pub correlation: f64,
    pub reason: RedundancyReason,
}

/// What the Selector dropped and why.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SelectReport {
    pub target: String,
    pub quasi_constant: Vec<String>,
    pub irrelevant: Vec<String>,
    pub redundant: Vec<RedundantColumn>,
    /// Absolute target correlation of each scored numeric feature.
    pub target_correlations: BTreeMap<String, f64>,
    pub kept: Vec<String>,
}

impl SelectReport {
    pub fn dropped_count(&self) -> usize {
        self.quasi_constant.len() + self.irrelevant.len() + self.redundant.len()
    }
}

/// Reduced dataset plus the report describing the decisions.
#[derive(Debug, Clone)]
pub struct Selected {
    pub dataset: Dataset,
    pub report: SelectReport,
}

/// Runs the selection passes. The target column is never dropped.
pub fn select(dataset: Dataset, target: &str, options: &SelectOptions) -> Result<Selected> {
    options.validate()?;
    let Some(target_column) = dataset.column(target) else {
        return Err(PrepError::TargetNotFound {
            target: target.to_string(),
            stage: Stage::Select,
        });
    };
    if dataset.is_empty() {
        return Err(PrepError::EmptyDataset {
            stage: Stage::Select,
            step: "input",
        });
    }
    let mut report = SelectReport {
        target: target.to_string(),
        ..SelectReport::default()
    };
    // Booleans and text are categorical targets: no relevance scores.
    let target_values = target_column.data().as_numeric();

    let features: Vec<&str> = dataset
        .column_names()
        .into_iter()
        .filter(|name| *name != target)
        .collect();

    // 1. quasi-constant
    let mut remaining = Vec::with_capacity(features.len());
    for name in features {
        let Some(column) = dataset.column(name) else {
            continue;
        };
        let ratio = dominant_ratio(column.data());
        if ratio > options.quasi_constant_ratio {
            debug!(column = name, ratio, "quasi-constant column");
            report.quasi_constant.push(name.to_string());
        } else {
            remaining.push(name);
        }
    }

    // 2. relevance
    let mut scores: BTreeMap<&str, f64> = BTreeMap::new();
    if let Some(target_values) = target_values {
        let mut relevant = Vec::with_capacity(remaining.len());
        for name in remaining {
            let numeric = dataset.column(name).and_then(|c| c.data().as_numeric());
            let Some(values) = numeric else {
                relevant.push(name);
                continue;
            };
            match pearson(values, target_values).map(f64::abs) {
                Some(score) if score < options.relevance_floor => {
                    debug!(column = name, score, "low relevance column");
                    report.irrelevant.push(name.to_string());
                }
                Some(score) => {
                    scores.insert(name, score);
                    relevant.push(name);
                }
                None => relevant.push(name),
            }
        }
        remaining = relevant;
    } else {
        debug!(
            target_column = target,
            "target is not numeric, skipping relevance filter"
        );
    }

    // 3. redundancy
    let numeric: Vec<(&str, &[Option<f64>])> = remaining
        .iter()
        .filter_map(|name| {
            let values = dataset.column(name)?.data().as_numeric()?;
            Some((*name, values))
        })
        .collect();
    let matrix = CorrelationMatrix::compute(&numeric);
    let mut marked: BTreeSet<String> = BTreeSet::new();
    for (i, j, correlation) in matrix.pairs_above(options.correlation_threshold) {
        let a = numeric[i].0;
        let b = numeric[j].0;
        let (drop, keep, reason) = match (scores.get(a), scores.get(b)) {
            (Some(score_a), Some(score_b)) if score_a < score_b => {
                (a, b, RedundancyReason::LowerTargetCorrelation)
            }
            (Some(score_a), Some(score_b)) if score_a > score_b => {
                (b, a, RedundancyReason::LowerTargetCorrelation)
            }
            _ => (b, a, RedundancyReason::LaterColumn),
        };
        debug!(dropped = drop, kept = keep, correlation, "redundant pair");
        if marked.insert(drop.to_string()) {
            report.redundant.push(RedundantColumn {
                column: drop.to_string(),
                partner: keep.to_string(),
                correlation,
                reason,
            });
        }
    }

    report.target_correlations = scores
        .into_iter()
        .map(|(name, score)| (name.to_string(), score))
        .collect();

    // 4. reassembly
    let mut to_drop: BTreeSet<String> = marked;
    to_drop.extend(report.quasi_constant.iter().cloned());
    to_drop.extend(report.irrelevant.iter().cloned());
    to_drop.remove(target);

    let dataset = dataset.drop_columns(&to_drop).move_to_end(target)?;
    if dataset.width() <= 1 {
        return Err(PrepError::EmptyDataset {
            stage: Stage::Select,
            step: "reassembly",
        });
    }
    report.kept = dataset
        .column_names()
        .into_iter()
        .filter(|name| *name != target)
        .map(str::to_string)
        .collect();
    info!(
        dropped = report.dropped_count(),
        kept = report.kept.len(),
        "feature selection complete"
    );
    Ok(Selected { dataset, report })
}
