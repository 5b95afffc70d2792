//! Property tests for the Cleaner and Selector invariants.

use prep_model::{CleanOptions, Column, ColumnData, Dataset, SelectOptions};
use prep_transform::{clean, drop_sparse_rows, min_populated_cells, remove_outliers, select};
use proptest::prelude::*;

type Row = (Option<f64>, Option<u8>, Option<&'static str>);

fn row() -> impl Strategy<Value = Row> {
    (
        proptest::option::of(-50.0f64..50.0),
        proptest::option::of(0u8..30),
        proptest::option::of(prop_oneof![Just("a"), Just("b"), Just("c")]),
    )
}

fn dataset(rows: &[Row]) -> Dataset {
    Dataset::new(vec![
        Column::numeric("x", rows.iter().map(|r| r.0).collect()),
        Column::numeric("y", rows.iter().map(|r| r.1.map(f64::from)).collect()),
        Column::text(
            "label",
            rows.iter().map(|r| r.2.map(str::to_string)).collect(),
        ),
    ])
    .unwrap()
}

proptest! {
    #[test]
    fn prop_surviving_rows_meet_threshold(
        rows in proptest::collection::vec(row(), 1..40),
        threshold in 0.0f64..=1.0,
    ) {
        let input = dataset(&rows);
        let required = min_populated_cells(threshold, input.width());
        let (kept, dropped) = drop_sparse_rows(input, threshold);
        prop_assert_eq!(kept.height() + dropped, rows.len());
        for row in 0..kept.height() {
            prop_assert!(kept.row_non_null_count(row) >= required);
        }
    }

    #[test]
    fn prop_cleaned_dataset_has_no_nulls(rows in proptest::collection::vec(row(), 1..40)) {
        if let Ok(cleaned) = clean(dataset(&rows), &CleanOptions::default()) {
            prop_assert!(!cleaned.dataset.is_empty());
            for column in cleaned.dataset.columns() {
                prop_assert_eq!(column.null_count(), 0);
            }
        }
    }

    #[test]
    fn prop_outlier_bounds_hold(values in proptest::collection::vec(-1000.0f64..1000.0, 1..60)) {
        let input = Dataset::new(vec![Column::from_f64("v", &values)]).unwrap();
        if let Ok((output, filters)) = remove_outliers(input, 10, 1.5) {
            let ColumnData::Numeric(kept) = output.column("v").unwrap().data() else {
                unreachable!()
            };
            for filter in &filters {
                for value in kept.iter().flatten() {
                    prop_assert!(*value >= filter.lower && *value <= filter.upper);
                }
            }
        }
    }

    #[test]
    fn prop_selector_preserves_target(rows in proptest::collection::vec(row(), 2..40)) {
        let input = dataset(&rows);
        let target = input.column("y").unwrap().clone();
        if let Ok(selected) = select(input, "y", &SelectOptions::default()) {
            let names = selected.dataset.column_names();
            prop_assert_eq!(names.last().copied(), Some("y"));
            prop_assert_eq!(selected.dataset.column("y"), Some(&target));
            prop_assert_eq!(selected.dataset.height(), rows.len());
        }
    }
}
