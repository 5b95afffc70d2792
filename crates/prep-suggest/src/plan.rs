//! Parsing of feature plans returned by a language model.

use prep_model::FeatureCandidate;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Result, SuggestError};

/// Removes markdown code fences around a response.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Parses a JSON list of `{name, expression, rationale?}` objects.
///
/// Missing names default to [`prep_model::DEFAULT_FEATURE_NAME`] and missing
/// expressions to an empty string. Entries that are not objects with text
/// fields are skipped.
pub fn parse_plan(text: &str) -> Result<Vec<FeatureCandidate>> {
    let body = strip_code_fences(text);
    let value: Value = serde_json::from_str(body).map_err(|e| SuggestError::InvalidPlan {
        message: e.to_string(),
    })?;
    let Value::Array(items) = value else {
        return Err(SuggestError::InvalidPlan {
            message: format!("expected a JSON list, found {}", kind(&value)),
        });
    };

    let mut candidates = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let found = kind(&item);
        match serde_json::from_value::<FeatureCandidate>(item) {
            Ok(candidate) => candidates.push(candidate),
            Err(err) => warn!(index, found, error = %err, "skipping malformed plan entry"),
        }
    }
    debug!(candidates = candidates.len(), "feature plan parsed");
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use prep_model::DEFAULT_FEATURE_NAME;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n[]\n```"), "[]");
        assert_eq!(strip_code_fences("```\n[1]\n```\n"), "[1]");
        assert_eq!(strip_code_fences("  []  "), "[]");
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let plan = parse_plan(r#"[{"expression": "df['a'] * 2"}, {"name": "empty"}]"#).unwrap();
        assert_eq!(plan[0].name, DEFAULT_FEATURE_NAME);
        assert_eq!(plan[1].name, "empty");
        assert_eq!(plan[1].expression, "");
    }

    #[test]
    fn test_non_list_is_invalid() {
        let err = parse_plan(r#"{"name": "x"}"#).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid feature plan: expected a JSON list, found an object"
        );
    }

    #[test]
    fn test_invalid_json_is_invalid() {
        assert!(matches!(
            parse_plan("Here are some features!"),
            Err(SuggestError::InvalidPlan { .. })
        ));
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let plan = parse_plan(r#"["df['a']", {"name": 3}, {"name": "ok", "expression": "1"}]"#)
            .unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].name, "ok");
    }
}
