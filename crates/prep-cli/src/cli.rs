//! CLI argument definitions for `autoprep`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use crate::config::OptionOverrides;

#[derive(Parser)]
#[command(
    name = "autoprep",
    version,
    about = "Prepare a tabular dataset for automated model training",
    long_about = "Clean, prune and augment a CSV dataset before model training.\n\n\
                  Rows with too many missing cells and numeric outliers are dropped,\n\
                  nulls are imputed, quasi-constant, irrelevant and redundant columns\n\
                  are removed, and suggested feature expressions are evaluated in a\n\
                  restricted sandbox."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow cell values and expression text in logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the full pipeline and report feature outcomes.
    Run(RunArgs),

    /// Clean and select, then print the feature suggestion prompt.
    Prompt(PromptArgs),

    /// Print per-column statistics of a dataset.
    Inspect(InspectArgs),
}

/// Input dataset, target and options shared by `run` and `prompt`.
#[derive(Args)]
pub struct DatasetArgs {
    /// Path to the input CSV file.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Target column (default: the last column).
    #[arg(long, short = 't', value_name = "COL")]
    pub target: Option<String>,

    /// TOML file with pipeline options.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Free-text description of the dataset for the suggestion prompt.
    #[arg(long, value_name = "TEXT")]
    pub description: Option<String>,

    #[command(flatten)]
    pub overrides: OptionOverrides,
}

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// JSON feature plan (a saved model response) to apply.
    #[arg(long, value_name = "FILE")]
    pub plan: Option<PathBuf>,

    /// Write the augmented dataset to this CSV file.
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Write a JSON run report to this file.
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,
}

#[derive(Args)]
pub struct PromptArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Number of features to request.
    #[arg(long, value_name = "COUNT", default_value_t = prep_suggest::DEFAULT_FEATURE_COUNT)]
    pub features: usize,
}

#[derive(Args)]
pub struct InspectArgs {
    /// Path to the input CSV file.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
