//! Candidate features and their audit trail.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name given to a candidate whose producer did not supply one.
pub const DEFAULT_FEATURE_NAME: &str = "Unknown_Feature";

fn default_feature_name() -> String {
    DEFAULT_FEATURE_NAME.to_string()
}

/// An externally supplied request to derive a new column.
///
/// Candidates are produced by a suggestion source, consumed once by the
/// sandbox and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureCandidate {
    #[serde(default = "default_feature_name")]
    pub name: String,
    #[serde(default)]
    pub expression: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

impl FeatureCandidate {
    pub fn new(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expression: expression.into(),
            rationale: None,
        }
    }

    #[must_use]
    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }
}

/// Result of processing one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutcomeStatus {
    /// The column was added to (or replaced in) the dataset.
    Success,
    /// A static check refused the candidate before evaluation.
    Rejected,
    /// Parsing or evaluation failed.
    Failed,
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "Success",
            Self::Rejected => "Rejected",
            Self::Failed => "Failed",
        })
    }
}

/// Audit record for one candidate, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpressionOutcome {
    pub name: String,
    pub status: OutcomeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ExpressionOutcome {
    pub fn success(name: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            name: name.into(),
            status: OutcomeStatus::Success,
            detail,
        }
    }

    pub fn rejected(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: OutcomeStatus::Rejected,
            detail: Some(detail.into()),
        }
    }

    pub fn failed(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: OutcomeStatus::Failed,
            detail: Some(detail.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}
