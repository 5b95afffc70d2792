//! Tests for applying candidate batches to a dataset.

use prep_model::{
    CellValue, Column, ColumnData, Dataset, ExpressionOutcome, FeatureCandidate, OutcomeStatus,
    SandboxOptions,
};
use prep_sandbox::{Sandbox, apply};

fn housing() -> Dataset {
    Dataset::new(vec![
        Column::from_f64("a", &[1.0, 2.0, 3.0, 4.0]),
        Column::from_f64("b", &[2.0, 0.0, 1.0, 4.0]),
        Column::from_strs("city", &["x", "y", "x", "z"]),
        Column::from_f64("price", &[10.0, 20.0, 30.0, 40.0]),
    ])
    .unwrap()
}

fn run(candidates: &[FeatureCandidate]) -> (Dataset, Vec<ExpressionOutcome>) {
    apply(housing(), candidates, &SandboxOptions::default(), Some("price")).unwrap()
}

#[test]
fn test_denied_expression_never_touches_dataset() {
    let input = housing();
    let candidates = [
        FeatureCandidate::new("shell", "__import__('os').system('ls')"),
        FeatureCandidate::new("reader", "open('/etc/passwd')"),
        FeatureCandidate::new("a", "import os"),
    ];

    let (output, outcomes) = apply(
        input.clone(),
        &candidates,
        &SandboxOptions::default(),
        Some("price"),
    )
    .unwrap();

    assert_eq!(output, input);
    assert!(outcomes.iter().all(|o| o.status == OutcomeStatus::Rejected));
}

#[test]
fn test_one_malformed_candidate_does_not_affect_others() {
    let candidates = [
        FeatureCandidate::new("ratio", "df['a'] / (df['b'] + 1e-6)"),
        FeatureCandidate::new("broken", "df['a'] * (df['b']"),
        FeatureCandidate::new("city_x", "(df['city'] == 'x').astype(int)"),
        FeatureCandidate::new("log_a", "np.log1p(df['a'])"),
    ];

    let (output, outcomes) = run(&candidates);

    assert_eq!(outcomes.len(), 4);
    let statuses: Vec<OutcomeStatus> = outcomes.iter().map(|o| o.status).collect();
    assert_eq!(
        statuses,
        vec![
            OutcomeStatus::Success,
            OutcomeStatus::Failed,
            OutcomeStatus::Success,
            OutcomeStatus::Success
        ]
    );
    assert_eq!(
        output.column_names(),
        vec!["a", "b", "city", "price", "ratio", "city_x", "log_a"]
    );
    assert_eq!(
        output.column("city_x").unwrap().data(),
        &ColumnData::Numeric(vec![Some(1.0), Some(0.0), Some(1.0), Some(0.0)])
    );
}

#[test]
fn test_blank_expressions_are_skipped_silently() {
    let candidates = [
        FeatureCandidate::new("nothing", ""),
        FeatureCandidate::new("spaces", "   "),
        FeatureCandidate::new("double", "df['a'] * 2"),
    ];

    let (output, outcomes) = run(&candidates);

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].name, "double");
    assert_eq!(output.width(), 5);
}

#[test]
fn test_target_column_cannot_be_read_or_replaced() {
    let input = housing();
    let target_before = input.column("price").unwrap().clone();
    let candidates = [
        FeatureCandidate::new("leak", "df['price'] * 2"),
        FeatureCandidate::new("leak_attr", "df.price + df['a']"),
        FeatureCandidate::new("price", "df['a'] * 2"),
    ];

    let (output, outcomes) = apply(
        input,
        &candidates,
        &SandboxOptions::default(),
        Some("price"),
    )
    .unwrap();

    assert!(outcomes.iter().all(|o| o.status == OutcomeStatus::Rejected));
    assert_eq!(output.column("price"), Some(&target_before));
    assert_eq!(output.width(), 4);
}

#[test]
fn test_without_target_any_column_is_readable() {
    let (output, outcomes) = apply(
        housing(),
        &[FeatureCandidate::new("double_price", "df['price'] * 2")],
        &SandboxOptions::default(),
        None,
    )
    .unwrap();

    assert!(outcomes[0].is_success());
    assert_eq!(
        output.column("double_price").unwrap().data().get(3),
        CellValue::Number(80.0)
    );
}

#[test]
fn test_existing_feature_is_replaced_in_place() {
    let (output, outcomes) = run(&[FeatureCandidate::new("b", "df['b'] + 1")]);

    assert_eq!(outcomes[0].detail.as_deref(), Some("replaced existing column"));
    assert_eq!(output.column_names(), vec!["a", "b", "city", "price"]);
    assert_eq!(output.column("b").unwrap().data().get(1), CellValue::Number(1.0));
}

#[test]
fn test_step_budget_exhaustion_fails_candidate() {
    let options = SandboxOptions {
        max_steps: 5,
        ..SandboxOptions::default()
    };
    let sandbox = Sandbox::new(options).unwrap();

    let (_, outcomes) = sandbox.apply(
        housing(),
        &[FeatureCandidate::new("a_plus", "df['a'] + 1")],
        Some("price"),
    );

    assert_eq!(outcomes[0].status, OutcomeStatus::Failed);
    assert_eq!(
        outcomes[0].detail.as_deref(),
        Some("evaluation exceeded the step budget of 5")
    );
}

#[test]
fn test_invalid_options_are_reported() {
    let options = SandboxOptions {
        max_depth: 0,
        ..SandboxOptions::default()
    };
    assert!(apply(housing(), &[], &options, None).is_err());
}

#[test]
fn test_extra_denied_tokens() {
    let options = SandboxOptions {
        extra_denied: vec!["city".to_string()],
        ..SandboxOptions::default()
    };
    let (_, outcomes) = apply(
        housing(),
        &[FeatureCandidate::new("c", "df['city'].str.len()")],
        &options,
        None,
    )
    .unwrap();
    assert_eq!(outcomes[0].status, OutcomeStatus::Rejected);
}

#[test]
fn test_outcome_audit_trail() {
    let candidates = [
        FeatureCandidate::new("a_per_b", "df['a'] / df['b']"),
        FeatureCandidate::new("shell", "__import__('os').system('ls')"),
        FeatureCandidate::new("broken", "df['a'] +"),
        FeatureCandidate::new("blank", "  "),
        FeatureCandidate::new("leak", "df['price'] * 2"),
        FeatureCandidate::new("rolling", "df['a'].rolling(3).mean()"),
        FeatureCandidate::new("a", "df['a'] * 10"),
        FeatureCandidate::new("constant", "1 + 2"),
        FeatureCandidate::new("ghost", "df['missing'] - 1"),
    ];

    let (_, outcomes) = run(&candidates);

    insta::assert_json_snapshot!(outcomes, @r###"
    [
      {
        "name": "a_per_b",
        "status": "Success",
        "detail": "1 non-finite values set to null"
      },
      {
        "name": "shell",
        "status": "Rejected",
        "detail": "expression contains forbidden token 'import'"
      },
      {
        "name": "broken",
        "status": "Failed",
        "detail": "syntax error at offset 9: unexpected end of expression"
      },
      {
        "name": "leak",
        "status": "Rejected",
        "detail": "expression references target column 'price'"
      },
      {
        "name": "rolling",
        "status": "Failed",
        "detail": "unknown function 'rolling'"
      },
      {
        "name": "a",
        "status": "Success",
        "detail": "replaced existing column"
      },
      {
        "name": "constant",
        "status": "Failed",
        "detail": "expression evaluates to a scalar, not a column"
      },
      {
        "name": "ghost",
        "status": "Failed",
        "detail": "column 'missing' not found"
      }
    ]
    "###);
}
