//! Data preparation pipeline.
//!
//! The pipeline runs these stages in order:
//! 1. **Clean**: drop sparse rows, impute nulls, remove IQR outliers
//! 2. **Select**: drop quasi-constant, irrelevant and redundant features
//! 3. **Suggest**: ask a [`prep_suggest::SuggestionSource`] for candidate features
//! 4. **Sandbox**: validate and evaluate the candidates
//!
//! The task type of the target is detected on the final dataset and
//! reported for the training step that follows.

mod pipeline;
mod report;
mod task;

pub use pipeline::{Pipeline, PipelineOutput, Prepared, StageTiming, SuggestReport};
pub use report::{ColumnSummary, RunReport};
pub use task::{
    CLASS_LABEL_MAX_DISTINCT, CLASS_LABEL_MAX_RATIO, TaskType, detect_task_type, suggest_target,
};
