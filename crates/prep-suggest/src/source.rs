//! Suggestion sources.
//!
//! A [`SuggestionSource`] turns a [`SuggestionRequest`] into candidate
//! features. Network-backed sources live outside this workspace; the
//! sources here cover fixed lists and plans saved to disk.

use std::path::{Path, PathBuf};

use prep_model::FeatureCandidate;
use tracing::info;

use crate::error::{Result, SuggestError};
use crate::plan::parse_plan;
use crate::prompt::SuggestionRequest;

/// Produces candidate features for a reduced dataset.
pub trait SuggestionSource {
    /// Short name used in logs and reports.
    fn name(&self) -> &str;

    fn suggest(&self, request: &SuggestionRequest<'_>) -> Result<Vec<FeatureCandidate>>;
}

/// Never suggests anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSuggestions;

impl SuggestionSource for NoSuggestions {
    fn name(&self) -> &str {
        "none"
    }

    fn suggest(&self, _request: &SuggestionRequest<'_>) -> Result<Vec<FeatureCandidate>> {
        Ok(Vec::new())
    }
}

/// Returns a fixed list of candidates.
#[derive(Debug, Clone, Default)]
pub struct StaticSuggestions {
    candidates: Vec<FeatureCandidate>,
}

impl StaticSuggestions {
    pub fn new(candidates: Vec<FeatureCandidate>) -> Self {
        Self { candidates }
    }
}

impl SuggestionSource for StaticSuggestions {
    fn name(&self) -> &str {
        "static"
    }

    fn suggest(&self, _request: &SuggestionRequest<'_>) -> Result<Vec<FeatureCandidate>> {
        Ok(self.candidates.clone())
    }
}

/// Reads a model response saved to a file and parses it as a plan.
#[derive(Debug, Clone)]
pub struct PlanFileSource {
    path: PathBuf,
}

impl PlanFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SuggestionSource for PlanFileSource {
    fn name(&self) -> &str {
        "plan-file"
    }

    fn suggest(&self, _request: &SuggestionRequest<'_>) -> Result<Vec<FeatureCandidate>> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| SuggestError::PlanRead {
            path: self.path.clone(),
            source: e,
        })?;
        let candidates = parse_plan(&text)?;
        info!(
            path = %self.path.display(),
            candidates = candidates.len(),
            "feature plan loaded"
        );
        Ok(candidates)
    }
}
