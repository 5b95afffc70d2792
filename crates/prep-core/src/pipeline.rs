//! Stage sequencing.
//!
//! Each stage takes ownership of the dataset produced by the previous one
//! and hands a new dataset forward. Fatal errors from the Cleaner or the
//! Selector stop the run; suggestion failures and per-candidate problems
//! never do.

use std::time::Instant;

use prep_model::{
    Dataset, ExpressionOutcome, FeatureCandidate, PipelineOptions, PrepError, Result, Stage,
};
use prep_sandbox::Sandbox;
use prep_suggest::{SuggestionRequest, SuggestionSource};
use prep_transform::{CleanReport, SelectReport, clean, select};
use serde::Serialize;
use tracing::{info, info_span, warn};

use crate::task::{TaskType, detect_task_type};

/// Elapsed time of one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageTiming {
    pub stage: Stage,
    pub duration_ms: u64,
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// What the suggestion source returned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SuggestReport {
    pub source: String,
    pub received: usize,
    /// Error that made the run continue without suggestions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Cleaned and reduced dataset, before any suggestion is applied.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub dataset: Dataset,
    pub clean: CleanReport,
    pub select: SelectReport,
    pub timings: Vec<StageTiming>,
}

/// Result of a full pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Augmented dataset, ready for training.
    pub dataset: Dataset,
    pub clean: CleanReport,
    pub select: SelectReport,
    pub suggest: SuggestReport,
    /// One outcome per non-blank candidate, in suggestion order.
    pub outcomes: Vec<ExpressionOutcome>,
    pub task_type: TaskType,
    pub timings: Vec<StageTiming>,
}

/// Cleaner, Selector, suggestion source and sandbox run in sequence.
#[derive(Debug, Clone)]
pub struct Pipeline {
    options: PipelineOptions,
    sandbox: Sandbox,
}

impl Pipeline {
    /// Validates `options` and builds the pipeline.
    pub fn new(options: PipelineOptions) -> Result<Self> {
        options.validate()?;
        let sandbox = Sandbox::new(options.sandbox.clone())?;
        Ok(Self { options, sandbox })
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Runs the Cleaner and the Selector.
    pub fn prepare(&self, dataset: Dataset, target: &str) -> Result<Prepared> {
        if !dataset.contains(target) {
            return Err(PrepError::TargetNotFound {
                target: target.to_string(),
                stage: Stage::Clean,
            });
        }
        let mut timings = Vec::with_capacity(4);

        let cleaned = info_span!("clean", rows = dataset.height()).in_scope(|| {
            let start = Instant::now();
            let cleaned = clean(dataset, &self.options.clean)?;
            timings.push(StageTiming {
                stage: Stage::Clean,
                duration_ms: elapsed_ms(start),
            });
            Ok::<_, PrepError>(cleaned)
        })?;

        let selected = info_span!("select", target_column = %target).in_scope(|| {
            let start = Instant::now();
            let selected = select(cleaned.dataset, target, &self.options.select)?;
            timings.push(StageTiming {
                stage: Stage::Select,
                duration_ms: elapsed_ms(start),
            });
            Ok::<_, PrepError>(selected)
        })?;

        Ok(Prepared {
            dataset: selected.dataset,
            clean: cleaned.report,
            select: selected.report,
            timings,
        })
    }

    /// Runs every stage and returns the augmented dataset with its reports.
    pub fn run(
        &self,
        dataset: Dataset,
        target: &str,
        source: &dyn SuggestionSource,
    ) -> Result<PipelineOutput> {
        let run_span = info_span!("pipeline", target_column = %target, source = source.name());
        let _run_guard = run_span.enter();
        let run_start = Instant::now();

        let Prepared {
            dataset,
            clean,
            select,
            mut timings,
        } = self.prepare(dataset, target)?;

        let (candidates, suggest) = info_span!("suggest").in_scope(|| {
            let start = Instant::now();
            let result = self.suggest(&dataset, target, source);
            timings.push(StageTiming {
                stage: Stage::Suggest,
                duration_ms: elapsed_ms(start),
            });
            result
        });

        let (dataset, outcomes) = info_span!("sandbox").in_scope(|| {
            let start = Instant::now();
            let result = self.sandbox.apply(dataset, &candidates, Some(target));
            timings.push(StageTiming {
                stage: Stage::Sandbox,
                duration_ms: elapsed_ms(start),
            });
            result
        });

        let task_type = detect_task_type(&dataset, target)?;
        info!(
            rows = dataset.height(),
            columns = dataset.width(),
            %task_type,
            duration_ms = run_start.elapsed().as_millis(),
            "pipeline complete"
        );

        Ok(PipelineOutput {
            dataset,
            clean,
            select,
            suggest,
            outcomes,
            task_type,
            timings,
        })
    }

    fn suggest(
        &self,
        dataset: &Dataset,
        target: &str,
        source: &dyn SuggestionSource,
    ) -> (Vec<FeatureCandidate>, SuggestReport) {
        let request = SuggestionRequest::new(dataset, target, &self.options.description);
        let mut report = SuggestReport {
            source: source.name().to_string(),
            ..SuggestReport::default()
        };
        match source.suggest(&request) {
            Ok(candidates) => {
                report.received = candidates.len();
                info!(candidates = candidates.len(), "suggestions received");
                (candidates, report)
            }
            Err(err) => {
                warn!(error = %err, "suggestion source failed, continuing without suggestions");
                report.error = Some(err.to_string());
                (Vec::new(), report)
            }
        }
    }
}
