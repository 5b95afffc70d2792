//! End-to-end pipeline runs.

use prep_core::{Pipeline, TaskType};
use prep_model::{
    CellValue, Column, Dataset, FeatureCandidate, OutcomeStatus, PipelineOptions, PrepError,
    SelectOptions, Stage,
};
use prep_suggest::{
    NoSuggestions, StaticSuggestions, SuggestError, SuggestionRequest, SuggestionSource,
};

/// `[age, income, income_copy, zipcode, target]`, with a few missing ages.
fn housing() -> Dataset {
    let n = 200;
    let age: Vec<Option<f64>> = (0..n)
        .map(|i| (i % 50 != 3).then(|| f64::from(20 + (i * 7) % 43)))
        .collect();
    let income: Vec<f64> = (0..n)
        .map(|i| f64::from(1000 + ((i * 13) % 97) * 50))
        .collect();
    let zipcode: Vec<&str> = (0..n).map(|i| if i == 0 { "99999" } else { "10001" }).collect();
    let target: Vec<f64> = (0..n)
        .map(|i| {
            let age = f64::from(20 + (i * 7) % 43);
            2.0 * age + income[i as usize] / 100.0 + f64::from(i % 5)
        })
        .collect();
    Dataset::new(vec![
        Column::numeric("age", age),
        Column::from_f64("income", &income),
        Column::from_f64("income_copy", &income),
        Column::from_strs("zipcode", &zipcode),
        Column::from_f64("target", &target),
    ])
    .unwrap()
}

fn pipeline() -> Pipeline {
    Pipeline::new(PipelineOptions::default()).unwrap()
}

struct Unreachable;

impl SuggestionSource for Unreachable {
    fn name(&self) -> &str {
        "unreachable"
    }

    fn suggest(&self, _request: &SuggestionRequest<'_>) -> prep_suggest::Result<Vec<FeatureCandidate>> {
        Err(SuggestError::Unavailable {
            message: "connection refused".to_string(),
        })
    }
}

#[test]
fn test_full_run() {
    let source = StaticSuggestions::new(vec![
        FeatureCandidate::new("income_per_age", "df['income'] / (df['age'] + 1e-6)"),
        FeatureCandidate::new("leak", "df['target'] * 2"),
        FeatureCandidate::new("shell", "import os"),
        FeatureCandidate::new("zip_len", "df['zipcode'].str.len()"),
        FeatureCandidate::new("skipped", ""),
    ]);

    let output = pipeline().run(housing(), "target", &source).unwrap();

    assert_eq!(output.clean.rows_in, 200);
    assert_eq!(output.clean.imputed.len(), 1);
    assert_eq!(output.clean.imputed[0].column, "age");
    assert_eq!(output.select.quasi_constant, vec!["zipcode"]);
    assert_eq!(output.select.redundant[0].column, "income_copy");
    assert_eq!(
        output.dataset.column_names(),
        vec!["age", "income", "target", "income_per_age"]
    );
    let statuses: Vec<OutcomeStatus> = output.outcomes.iter().map(|o| o.status).collect();
    assert_eq!(
        statuses,
        vec![
            OutcomeStatus::Success,
            OutcomeStatus::Rejected,
            OutcomeStatus::Rejected,
            OutcomeStatus::Failed
        ]
    );
    assert_eq!(output.suggest.received, 5);
    assert_eq!(output.task_type, TaskType::Regression);
    let stages: Vec<Stage> = output.timings.iter().map(|t| t.stage).collect();
    assert_eq!(
        stages,
        vec![Stage::Clean, Stage::Select, Stage::Suggest, Stage::Sandbox]
    );
    assert_eq!(output.dataset.column("age").unwrap().null_count(), 0);
}

#[test]
fn test_failed_suggestion_source_is_not_fatal() {
    let output = pipeline().run(housing(), "target", &Unreachable).unwrap();

    assert!(output.outcomes.is_empty());
    assert_eq!(output.suggest.source, "unreachable");
    assert_eq!(
        output.suggest.error.as_deref(),
        Some("suggestion source unavailable: connection refused")
    );
    assert_eq!(output.dataset.column_names(), vec!["age", "income", "target"]);
}

#[test]
fn test_prepare_stops_before_suggestions() {
    let prepared = pipeline().prepare(housing(), "target").unwrap();
    assert_eq!(prepared.dataset.column_names(), vec!["age", "income", "target"]);
    assert_eq!(prepared.timings.len(), 2);
}

#[test]
fn test_missing_target_is_fatal() {
    let err = pipeline().run(housing(), "price", &NoSuggestions).unwrap_err();
    assert!(matches!(err, PrepError::TargetNotFound { .. }));
}

#[test]
fn test_empty_after_cleaning_is_fatal() {
    let dataset = Dataset::new(vec![
        Column::numeric("x", vec![None, None]),
        Column::numeric("y", vec![None, None]),
    ])
    .unwrap();

    let err = pipeline().run(dataset, "y", &NoSuggestions).unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Clean));
}

#[test]
fn test_no_surviving_features_is_fatal() {
    let options = PipelineOptions {
        select: SelectOptions {
            quasi_constant_ratio: 0.0,
            ..SelectOptions::default()
        },
        ..PipelineOptions::default()
    };
    let err = Pipeline::new(options)
        .unwrap()
        .run(housing(), "target", &NoSuggestions)
        .unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Select));
}

#[test]
fn test_invalid_options_are_rejected() {
    let mut options = PipelineOptions::default();
    options.clean.null_row_threshold = 1.5;
    assert!(matches!(
        Pipeline::new(options),
        Err(PrepError::InvalidOption { .. })
    ));
}

#[test]
fn test_run_report_serializes() {
    let source = StaticSuggestions::new(vec![FeatureCandidate::new(
        "age_squared",
        "df['age'] ** 2",
    )]);
    let output = pipeline().run(housing(), "target", &source).unwrap();

    let json = serde_json::to_value(output.report()).unwrap();

    assert_eq!(json["target"], "target");
    assert_eq!(json["task_type"], "regression");
    assert_eq!(json["rows"], output.dataset.height());
    assert_eq!(json["columns"][3]["name"], "age_squared");
    assert_eq!(json["columns"][3]["data_type"], "numeric");
    insta::assert_json_snapshot!(json["outcomes"], @r###"
    [
      {
        "name": "age_squared",
        "status": "Success"
      }
    ]
    "###);
    assert_eq!(
        output.dataset.column("age_squared").unwrap().data().get(1),
        CellValue::Number(729.0)
    );
}
