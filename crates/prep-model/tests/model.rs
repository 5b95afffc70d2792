use std::collections::BTreeSet;

use prep_model::{
    CellValue, CleanOptions, Column, ColumnData, DataType, Dataset, PipelineOptions, PrepError,
    SelectOptions,
};

fn sample() -> Dataset {
    Dataset::new(vec![
        Column::from_f64("age", &[31.0, 45.0, 27.0]),
        Column::from_strs("city", &["Oslo", "Lima", "Pune"]),
        Column::boolean("member", vec![Some(true), None, Some(false)]),
    ])
    .unwrap()
}

#[test]
fn test_new_rejects_duplicate_names() {
    let err = Dataset::new(vec![
        Column::from_f64("a", &[1.0]),
        Column::from_f64("a", &[2.0]),
    ])
    .unwrap_err();
    assert!(matches!(err, PrepError::DuplicateColumn { name } if name == "a"));
}

#[test]
fn test_new_rejects_misaligned_columns() {
    let err = Dataset::new(vec![
        Column::from_f64("a", &[1.0, 2.0]),
        Column::from_f64("b", &[1.0]),
    ])
    .unwrap_err();
    assert!(matches!(
        err,
        PrepError::LengthMismatch {
            expected: 2,
            actual: 1,
            ..
        }
    ));
}

#[test]
fn test_filter_rows_keeps_alignment() {
    let filtered = sample().filter_rows(&[true, false, true]);

    assert_eq!(filtered.height(), 2);
    let age = filtered.column("age").unwrap().data();
    let city = filtered.column("city").unwrap().data();
    let member = filtered.column("member").unwrap().data();
    assert_eq!(age.get(1), CellValue::Number(27.0));
    assert_eq!(city.get(1), CellValue::Text("Pune".to_string()));
    assert_eq!(member.get(1), CellValue::Boolean(false));
}

#[test]
fn test_upsert_replaces_in_place() {
    let mut dataset = sample();
    let replaced = dataset
        .upsert_column(Column::from_f64("city", &[1.0, 2.0, 3.0]))
        .unwrap();

    assert!(replaced);
    assert_eq!(dataset.column_names(), vec!["age", "city", "member"]);
    assert_eq!(dataset.column("city").unwrap().data_type(), DataType::Numeric);
}

#[test]
fn test_upsert_appends_and_checks_length() {
    let mut dataset = sample();
    assert!(
        !dataset
            .upsert_column(Column::from_f64("score", &[0.1, 0.2, 0.3]))
            .unwrap()
    );
    assert_eq!(dataset.width(), 4);

    let err = dataset
        .upsert_column(Column::from_f64("short", &[0.1]))
        .unwrap_err();
    assert!(matches!(err, PrepError::LengthMismatch { .. }));
}

#[test]
fn test_drop_columns_preserves_order() {
    let names: BTreeSet<String> = ["city".to_string()].into_iter().collect();
    let dataset = sample().drop_columns(&names);
    assert_eq!(dataset.column_names(), vec!["age", "member"]);
    assert_eq!(dataset.height(), 3);
}

#[test]
fn test_move_to_end() {
    let dataset = sample().move_to_end("age").unwrap();
    assert_eq!(dataset.column_names(), vec!["city", "member", "age"]);
    assert!(sample().move_to_end("missing").is_err());
}

#[test]
fn test_row_non_null_count() {
    let dataset = sample();
    assert_eq!(dataset.row_non_null_count(0), 3);
    assert_eq!(dataset.row_non_null_count(1), 2);
}

#[test]
fn test_head_truncates_every_column() {
    let head = sample().head(2);
    assert_eq!(head.height(), 2);
    assert!(
        head.columns()
            .iter()
            .all(|c| c.len() == 2 && matches!(c.data(), ColumnData::Numeric(_) | ColumnData::Text(_) | ColumnData::Boolean(_)))
    );
}

#[test]
fn test_option_validation() {
    assert!(PipelineOptions::default().validate().is_ok());

    let clean = CleanOptions {
        null_row_threshold: 1.5,
        ..CleanOptions::default()
    };
    assert!(matches!(
        clean.validate(),
        Err(PrepError::InvalidOption { option: "clean.null_row_threshold", .. })
    ));

    let select = SelectOptions {
        relevance_floor: -0.1,
        ..SelectOptions::default()
    };
    assert!(select.validate().is_err());
}

#[test]
fn test_options_partial_toml() {
    let options: PipelineOptions = toml::from_str(
        r#"
        [select]
        correlation_threshold = 0.9
        "#,
    )
    .unwrap();

    assert_eq!(options.select.correlation_threshold, 0.9);
    assert_eq!(options.select.quasi_constant_ratio, 0.99);
    assert_eq!(options.clean, CleanOptions::default());
}
