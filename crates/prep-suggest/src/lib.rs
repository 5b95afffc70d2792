//! Feature suggestion seam.
//!
//! Candidate features come from an external source, usually a language
//! model prompted with the reduced dataset. This crate builds that prompt,
//! parses the model's JSON plan and defines the [`SuggestionSource`] trait
//! the pipeline calls.

mod error;
mod plan;
mod prompt;
mod source;

pub use error::{Result, SuggestError};
pub use plan::{parse_plan, strip_code_fences};
pub use prompt::{
    DEFAULT_FEATURE_COUNT, SAMPLE_ROWS, SuggestionRequest, build_prompt, sample_csv,
};
pub use source::{NoSuggestions, PlanFileSource, StaticSuggestions, SuggestionSource};
