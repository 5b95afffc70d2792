//! Restricted expression sandbox for derived features.
//!
//! Candidate features arrive as text from an untrusted source. Each one goes
//! through the same sequence:
//!
//! 1. skipped without an outcome when its expression is blank
//! 2. static checks: usable name, not the target, [`deny::DenyList`]
//! 3. parsed into an [`ast::Expr`] by the [`parser`]; reads of the target
//!    column are rejected
//! 4. evaluated by [`interp::Evaluator`] under a step and time budget
//! 5. the resulting column is added to the dataset, replacing any column of
//!    the same name
//!
//! One candidate's failure never affects the others. The returned outcomes
//! follow the input order.

pub mod ast;
pub mod deny;
pub mod error;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod value;

use std::time::Instant;

use prep_model::redact::redact_value;
use prep_model::{
    Column, ColumnData, Dataset, ExpressionOutcome, FeatureCandidate, SandboxOptions,
};
use tracing::{debug, info, info_span, warn};

pub use deny::{DENIED_TOKENS, DenyList};
pub use error::{ExprError, Result};
pub use parser::{DATASET_BINDING, parse};

/// A column produced by one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Derived {
    pub data: ColumnData,
    /// Cells nulled because the computation produced NaN or infinity.
    pub nulled: usize,
}

/// Validates and evaluates candidate expressions.
#[derive(Debug, Clone)]
pub struct Sandbox {
    options: SandboxOptions,
    deny: DenyList,
}

impl Sandbox {
    pub fn new(options: SandboxOptions) -> prep_model::Result<Self> {
        options.validate()?;
        let deny = DenyList::new(&options.extra_denied, options.max_expression_len);
        Ok(Self { options, deny })
    }

    pub fn options(&self) -> &SandboxOptions {
        &self.options
    }

    /// Runs the static checks and parses the expression.
    pub fn check(&self, candidate: &FeatureCandidate, target: Option<&str>) -> Result<ast::Expr> {
        let name = candidate.name.trim();
        if name.is_empty() {
            return Err(ExprError::EmptyName);
        }
        if target == Some(name) {
            return Err(ExprError::TargetOverwrite {
                name: name.to_string(),
            });
        }
        self.deny.check(&candidate.expression)?;
        let expr = parse(&candidate.expression, self.options.max_depth)?;
        if let Some(target) = target
            && expr.columns().contains(target)
        {
            return Err(ExprError::TargetReference {
                column: target.to_string(),
            });
        }
        Ok(expr)
    }

    /// Checks and evaluates one candidate against `dataset`.
    pub fn derive(
        &self,
        dataset: &Dataset,
        candidate: &FeatureCandidate,
        target: Option<&str>,
    ) -> Result<Derived> {
        let expr = self.check(candidate, target)?;
        let mut evaluator = interp::Evaluator::new(dataset, &self.options);
        let value = evaluator.evaluate(&expr)?;
        debug!(steps = evaluator.steps(), "expression evaluated");
        let data = match value {
            value::Value::Column(data) => data,
            value::Value::Scalar(_) => return Err(ExprError::ScalarResult),
        };
        Ok(Derived {
            data,
            nulled: evaluator.nulled(),
        })
    }

    /// Applies every candidate in order and returns the augmented dataset
    /// with one outcome per non-blank candidate.
    pub fn apply(
        &self,
        mut dataset: Dataset,
        candidates: &[FeatureCandidate],
        target: Option<&str>,
    ) -> (Dataset, Vec<ExpressionOutcome>) {
        let span = info_span!("sandbox", candidates = candidates.len());
        let _guard = span.enter();
        let start = Instant::now();
        let mut outcomes = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            if candidate.expression.trim().is_empty() {
                debug!(name = %candidate.name, "skipping candidate without expression");
                continue;
            }
            debug!(
                name = %candidate.name,
                expression = redact_value(&candidate.expression),
                "evaluating candidate"
            );
            let outcome = match self.derive(&dataset, candidate, target) {
                Ok(derived) => {
                    let name = candidate.name.trim();
                    match dataset.upsert_column(Column::new(name, derived.data)) {
                        Ok(replaced) => {
                            ExpressionOutcome::success(name, success_detail(replaced, derived.nulled))
                        }
                        Err(err) => ExpressionOutcome::failed(name, err.to_string()),
                    }
                }
                Err(err) if err.is_rejection() => {
                    warn!(name = %candidate.name, reason = %err, "candidate rejected");
                    ExpressionOutcome::rejected(&candidate.name, err.to_string())
                }
                Err(err) => {
                    debug!(name = %candidate.name, error = %err, "candidate failed");
                    ExpressionOutcome::failed(&candidate.name, err.to_string())
                }
            };
            outcomes.push(outcome);
        }

        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        info!(
            succeeded,
            unsuccessful = outcomes.len() - succeeded,
            duration_ms = start.elapsed().as_millis(),
            "feature candidates applied"
        );
        (dataset, outcomes)
    }
}

fn success_detail(replaced: bool, nulled: usize) -> Option<String> {
    let mut notes = Vec::new();
    if replaced {
        notes.push("replaced existing column".to_string());
    }
    if nulled > 0 {
        notes.push(format!("{nulled} non-finite values set to null"));
    }
    (!notes.is_empty()).then(|| notes.join("; "))
}

/// Applies `candidates` to `dataset` with a sandbox built from `options`.
///
/// Fails only when the options are invalid; per-candidate problems are
/// reported in the returned outcomes.
pub fn apply(
    dataset: Dataset,
    candidates: &[FeatureCandidate],
    options: &SandboxOptions,
    target: Option<&str>,
) -> prep_model::Result<(Dataset, Vec<ExpressionOutcome>)> {
    let sandbox = Sandbox::new(options.clone())?;
    Ok(sandbox.apply(dataset, candidates, target))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_detail() {
        assert_eq!(success_detail(false, 0), None);
        assert_eq!(
            success_detail(true, 2).as_deref(),
            Some("replaced existing column; 2 non-finite values set to null")
        );
    }
}
