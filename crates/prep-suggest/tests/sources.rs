//! Suggestion sources against a small dataset.

use std::io::Write;

use prep_model::{Column, Dataset, FeatureCandidate};
use prep_suggest::{
    NoSuggestions, PlanFileSource, StaticSuggestions, SuggestError, SuggestionRequest,
    SuggestionSource,
};
use tempfile::NamedTempFile;

fn dataset() -> Dataset {
    Dataset::new(vec![
        Column::from_f64("income", &[100.0, 200.0]),
        Column::from_f64("family_size", &[2.0, 4.0]),
        Column::from_f64("spend", &[50.0, 70.0]),
    ])
    .unwrap()
}

fn plan_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

#[test]
fn test_plan_file_with_markdown_fences() {
    let file = plan_file(
        r#"```json
[
  {
    "name": "income_per_member",
    "expression": "df['income'] / (df['family_size'] + 1e-6)",
    "rationale": "Normalizes income by household size."
  },
  {"expression": "df['income'] * 2"}
]
```"#,
    );
    let dataset = dataset();
    let request = SuggestionRequest::new(&dataset, "spend", "Household budgets");

    let candidates = PlanFileSource::new(file.path()).suggest(&request).unwrap();

    insta::assert_json_snapshot!(candidates, @r###"
    [
      {
        "name": "income_per_member",
        "expression": "df['income'] / (df['family_size'] + 1e-6)",
        "rationale": "Normalizes income by household size."
      },
      {
        "name": "Unknown_Feature",
        "expression": "df['income'] * 2"
      }
    ]
    "###);
}

#[test]
fn test_plan_file_missing() {
    let dataset = dataset();
    let request = SuggestionRequest::new(&dataset, "spend", "");
    let source = PlanFileSource::new("/nonexistent/plan.json");
    assert!(matches!(
        source.suggest(&request),
        Err(SuggestError::PlanRead { .. })
    ));
}

#[test]
fn test_plan_file_not_a_list() {
    let file = plan_file(r#"{"features": []}"#);
    let dataset = dataset();
    let request = SuggestionRequest::new(&dataset, "spend", "");
    assert!(matches!(
        PlanFileSource::new(file.path()).suggest(&request),
        Err(SuggestError::InvalidPlan { .. })
    ));
}

#[test]
fn test_static_and_empty_sources() {
    let dataset = dataset();
    let request = SuggestionRequest::new(&dataset, "spend", "");
    let fixed = StaticSuggestions::new(vec![FeatureCandidate::new("double", "df['income'] * 2")]);

    assert_eq!(fixed.suggest(&request).unwrap().len(), 1);
    assert_eq!(fixed.name(), "static");
    assert!(NoSuggestions.suggest(&request).unwrap().is_empty());
}
