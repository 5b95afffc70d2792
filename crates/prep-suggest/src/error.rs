//! Error types for suggestion sources.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while producing feature candidates.
///
/// The orchestrator treats every variant as "no suggestions".
#[derive(Debug, Error)]
pub enum SuggestError {
    /// The response text is not a JSON list of candidates.
    #[error("invalid feature plan: {message}")]
    InvalidPlan { message: String },

    /// A saved plan could not be read.
    #[error("failed to read feature plan {path}: {source}")]
    PlanRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The dataset sample could not be rendered for the prompt.
    #[error("failed to render dataset sample: {message}")]
    Sample { message: String },

    /// The source could not be reached or returned an error.
    #[error("suggestion source unavailable: {message}")]
    Unavailable { message: String },
}

/// Result type for suggestion operations.
pub type Result<T> = std::result::Result<T, SuggestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SuggestError::InvalidPlan {
            message: "expected a JSON list, found an object".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid feature plan: expected a JSON list, found an object"
        );
    }
}
