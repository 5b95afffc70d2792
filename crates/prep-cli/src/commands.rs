//! Command implementations.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use prep_core::{Pipeline, PipelineOutput, suggest_target};
use prep_ingest::{read_dataset, write_dataset};
use prep_model::{Dataset, PipelineOptions};
use prep_suggest::{
    NoSuggestions, PlanFileSource, SuggestionRequest, SuggestionSource, build_prompt,
};
use prep_transform::{ColumnStats, describe};
use tracing::{info, info_span};

use crate::cli::{DatasetArgs, InspectArgs, PromptArgs, RunArgs};
use crate::config::resolve_options;

/// Result of `autoprep run`.
#[derive(Debug)]
pub struct RunResult {
    pub input: PathBuf,
    pub output: PipelineOutput,
    /// Where the augmented dataset was written.
    pub written: Option<PathBuf>,
    /// Where the JSON run report was written.
    pub report: Option<PathBuf>,
}

/// Result of `autoprep inspect`.
#[derive(Debug)]
pub struct InspectResult {
    pub input: PathBuf,
    pub rows: usize,
    pub columns: Vec<ColumnStats>,
}

struct Loaded {
    dataset: Dataset,
    target: String,
    options: PipelineOptions,
}

fn load(args: &DatasetArgs) -> Result<Loaded> {
    let options = resolve_options(
        args.config.as_deref(),
        &args.overrides,
        args.description.as_deref(),
    )?;
    let dataset =
        read_dataset(&args.input).with_context(|| format!("read {}", args.input.display()))?;
    let target = match &args.target {
        Some(target) => target.clone(),
        None => {
            let target = suggest_target(&dataset)
                .ok_or_else(|| anyhow!("{} has no columns", args.input.display()))?;
            info!(column = target, "no target given, using the last column");
            target.to_string()
        }
    };
    Ok(Loaded {
        dataset,
        target,
        options,
    })
}

pub fn run_pipeline(args: &RunArgs) -> Result<RunResult> {
    let input = args.dataset.input.clone();
    let span = info_span!("run", input = %input.display());
    let _guard = span.enter();

    let Loaded {
        dataset,
        target,
        options,
    } = load(&args.dataset)?;
    let pipeline = Pipeline::new(options).context("build pipeline")?;
    let source: Box<dyn SuggestionSource> = match &args.plan {
        Some(path) => Box::new(PlanFileSource::new(path)),
        None => Box::new(NoSuggestions),
    };

    let output = pipeline
        .run(dataset, &target, source.as_ref())
        .context("run pipeline")?;

    if let Some(path) = &args.output {
        write_dataset(&output.dataset, path)
            .with_context(|| format!("write {}", path.display()))?;
    }
    if let Some(path) = &args.report {
        write_report(&output, path)?;
    }

    Ok(RunResult {
        input,
        output,
        written: args.output.clone(),
        report: args.report.clone(),
    })
}

/// Writes the JSON run report.
pub fn write_report(output: &PipelineOutput, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&output.report()).context("serialize run report")?;
    std::fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), "run report written");
    Ok(())
}

/// Cleans and selects, then builds the suggestion prompt.
pub fn run_prompt(args: &PromptArgs) -> Result<String> {
    let Loaded {
        dataset,
        target,
        options,
    } = load(&args.dataset)?;
    let pipeline = Pipeline::new(options).context("build pipeline")?;
    let prepared = pipeline
        .prepare(dataset, &target)
        .context("prepare dataset")?;
    let request = SuggestionRequest::new(
        &prepared.dataset,
        &target,
        &pipeline.options().description,
    )
    .with_feature_count(args.features);
    build_prompt(&request).context("build prompt")
}

pub fn run_inspect(args: &InspectArgs) -> Result<InspectResult> {
    let dataset =
        read_dataset(&args.input).with_context(|| format!("read {}", args.input.display()))?;
    Ok(InspectResult {
        input: args.input.clone(),
        rows: dataset.height(),
        columns: describe(&dataset),
    })
}
