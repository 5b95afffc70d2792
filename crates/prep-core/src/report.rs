//! Serializable summary of a pipeline run.

use prep_model::{DataType, ExpressionOutcome};
use prep_transform::{CleanReport, SelectReport};
use serde::Serialize;

use crate::pipeline::{PipelineOutput, StageTiming, SuggestReport};
use crate::task::TaskType;

/// Name and type of one output column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub data_type: DataType,
}

/// Everything about a run except the data itself.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport<'a> {
    pub target: &'a str,
    pub task_type: TaskType,
    pub rows: usize,
    pub columns: Vec<ColumnSummary>,
    pub clean: &'a CleanReport,
    pub select: &'a SelectReport,
    pub suggest: &'a SuggestReport,
    pub outcomes: &'a [ExpressionOutcome],
    pub timings: &'a [StageTiming],
}

impl PipelineOutput {
    pub fn report(&self) -> RunReport<'_> {
        RunReport {
            target: &self.select.target,
            task_type: self.task_type,
            rows: self.dataset.height(),
            columns: self
                .dataset
                .columns()
                .iter()
                .map(|c| ColumnSummary {
                    name: c.name().to_string(),
                    data_type: c.data_type(),
                })
                .collect(),
            clean: &self.clean,
            select: &self.select,
            suggest: &self.suggest,
            outcomes: &self.outcomes,
            timings: &self.timings,
        }
    }
}
