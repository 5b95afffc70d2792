//! Task type detection and target suggestion.

use std::fmt;

use prep_model::{DataType, Dataset, PrepError, Result};
use prep_transform::stats::cardinality;
use serde::Serialize;

/// Numeric targets with fewer distinct values are class labels.
pub const CLASS_LABEL_MAX_DISTINCT: usize = 20;

/// Numeric targets whose distinct ratio is below this are class labels.
pub const CLASS_LABEL_MAX_RATIO: f64 = 0.05;

/// Learning task implied by the target column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Classification,
    Regression,
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Classification => "classification",
            Self::Regression => "regression",
        })
    }
}

/// Decides between classification and regression from the target column.
///
/// Non-numeric targets are classification. A numeric target is
/// classification when it has fewer than [`CLASS_LABEL_MAX_DISTINCT`]
/// distinct values or its distinct ratio is below [`CLASS_LABEL_MAX_RATIO`].
pub fn detect_task_type(dataset: &Dataset, target: &str) -> Result<TaskType> {
    let column = dataset.column(target).ok_or_else(|| PrepError::ColumnNotFound {
        name: target.to_string(),
    })?;
    if column.data_type() != DataType::Numeric {
        return Ok(TaskType::Classification);
    }
    let distinct = cardinality(column.data());
    let rows = column.len().max(1);
    if distinct < CLASS_LABEL_MAX_DISTINCT || (distinct as f64 / rows as f64) < CLASS_LABEL_MAX_RATIO
    {
        Ok(TaskType::Classification)
    } else {
        Ok(TaskType::Regression)
    }
}

/// Likely target column: the last one.
pub fn suggest_target(dataset: &Dataset) -> Option<&str> {
    dataset.columns().last().map(prep_model::Column::name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use prep_model::Column;

    #[test]
    fn test_text_target_is_classification() {
        let dataset = Dataset::new(vec![Column::from_strs("label", &["a", "b"])]).unwrap();
        assert_eq!(
            detect_task_type(&dataset, "label").unwrap(),
            TaskType::Classification
        );
    }

    #[test]
    fn test_few_distinct_numbers_are_classes() {
        let values: Vec<f64> = (0..100).map(|i| f64::from(i % 3)).collect();
        let dataset = Dataset::new(vec![Column::from_f64("y", &values)]).unwrap();
        assert_eq!(
            detect_task_type(&dataset, "y").unwrap(),
            TaskType::Classification
        );
    }

    #[test]
    fn test_low_distinct_ratio_is_classification() {
        let values: Vec<f64> = (0..1000).map(|i| f64::from(i % 40)).collect();
        let dataset = Dataset::new(vec![Column::from_f64("y", &values)]).unwrap();
        assert_eq!(
            detect_task_type(&dataset, "y").unwrap(),
            TaskType::Classification
        );
    }

    #[test]
    fn test_continuous_target_is_regression() {
        let values: Vec<f64> = (0..100).map(|i| f64::from(i) * 1.5).collect();
        let dataset = Dataset::new(vec![Column::from_f64("y", &values)]).unwrap();
        assert_eq!(detect_task_type(&dataset, "y").unwrap(), TaskType::Regression);
    }

    #[test]
    fn test_missing_target() {
        let dataset = Dataset::new(vec![Column::from_f64("x", &[1.0])]).unwrap();
        assert!(detect_task_type(&dataset, "y").is_err());
    }

    #[test]
    fn test_suggest_target_is_last_column() {
        let dataset = Dataset::new(vec![
            Column::from_f64("x", &[1.0]),
            Column::from_f64("price", &[2.0]),
        ])
        .unwrap();
        assert_eq!(suggest_target(&dataset), Some("price"));
        assert_eq!(suggest_target(&Dataset::default()), None);
    }
}
