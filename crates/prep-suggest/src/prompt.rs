//! Prompt construction for language-model feature suggestions.

use std::fmt::Write as _;

use prep_model::{Column, Dataset};
use prep_sandbox::{DATASET_BINDING, DENIED_TOKENS};

use crate::error::{Result, SuggestError};

/// Rows of the dataset included in the prompt.
pub const SAMPLE_ROWS: usize = 5;

/// Number of features requested by default.
pub const DEFAULT_FEATURE_COUNT: usize = 3;

/// Everything a suggestion source may look at.
#[derive(Debug, Clone, Copy)]
pub struct SuggestionRequest<'a> {
    /// Reduced dataset after cleaning and selection.
    pub dataset: &'a Dataset,
    pub target: &'a str,
    /// Free-text description of what the dataset contains.
    pub description: &'a str,
    pub feature_count: usize,
}

impl<'a> SuggestionRequest<'a> {
    pub fn new(dataset: &'a Dataset, target: &'a str, description: &'a str) -> Self {
        Self {
            dataset,
            target,
            description,
            feature_count: DEFAULT_FEATURE_COUNT,
        }
    }

    #[must_use]
    pub fn with_feature_count(mut self, feature_count: usize) -> Self {
        self.feature_count = feature_count;
        self
    }

    /// Columns a candidate expression may read.
    pub fn feature_columns(&self) -> impl Iterator<Item = &'a Column> + '_ {
        self.dataset
            .columns()
            .iter()
            .filter(|c| c.name() != self.target)
    }
}

fn schema_lines(request: &SuggestionRequest<'_>) -> String {
    let mut out = String::new();
    for column in request.dataset.columns() {
        let _ = write!(out, "- {}: {}", column.name(), column.data_type());
        if column.name() == request.target {
            out.push_str(" (target, never reference)");
        }
        out.push('\n');
    }
    out
}

/// Renders the first [`SAMPLE_ROWS`] rows as CSV, without the target column.
pub fn sample_csv(request: &SuggestionRequest<'_>) -> Result<String> {
    let sample_err = |message: String| SuggestError::Sample { message };
    let columns: Vec<&Column> = request.feature_columns().collect();
    let rows = request.dataset.height().min(SAMPLE_ROWS);

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(columns.iter().map(|c| c.name()))
        .map_err(|e| sample_err(e.to_string()))?;
    for row in 0..rows {
        writer
            .write_record(columns.iter().map(|c| c.data().get(row).to_string()))
            .map_err(|e| sample_err(e.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| sample_err(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| sample_err(e.to_string()))
}

/// Builds the feature engineering prompt for `request`.
pub fn build_prompt(request: &SuggestionRequest<'_>) -> Result<String> {
    let schema = schema_lines(request);
    let sample = sample_csv(request)?;
    let denied = DENIED_TOKENS
        .iter()
        .map(|t| format!("`{t}`"))
        .collect::<Vec<_>>()
        .join(", ");
    let df = DATASET_BINDING;
    let target = request.target;
    let count = request.feature_count;
    let description = request.description;

    Ok(format!(
        r#"### ROLE
You are an expert data scientist acting as a feature engineering agent. Your goal is to derive new, predictive columns from the dataset below to improve a machine learning model that predicts `{target}`.

### CONTEXT
1. **Dataset Description**: {description}
2. **Schema**:
{schema}3. **Data Sample (first {SAMPLE_ROWS} rows, target omitted)**:
{sample}
### INSTRUCTION
Suggest {count} high-impact new features. For each feature write one expression in the pandas-like expression language described below that computes the new column.

### CONSTRAINTS (STRICT)
1. **Input Data**: the dataset is named `{df}`. Read columns as `{df}['column']`.
2. **Grammar**: arithmetic (`+ - * / // % **`), comparisons, `&`, `|`, `~`, `.astype(int|float|bool|str)`, `.dt.<year|month|day|hour|dayofweek|quarter>`, `.str.<len|lower|upper|strip|contains>()`, `.fillna()`, `.clip()`, `.abs()`, `.round()`, aggregates (`.mean()`, `.median()`, `.std()`, `.sum()`, `.min()`, `.max()`), `np.log1p`, `np.sqrt`, `np.where`, `np.minimum`, `np.maximum`, `pd.to_datetime`. Nothing else is available.
3. **Safety**: expressions containing any of {denied} are rejected.
4. **Leakage**: never reference the target column `{target}` in an expression.
5. **Robustness**: guard every division against zero by adding a small epsilon (e.g. `+ 1e-6`).
6. **Format**: output a raw JSON list, without markdown formatting.

### OUTPUT FORMAT EXAMPLE
[
  {{
    "name": "Income_Per_Member",
    "expression": "{df}['Total_Income'] / ({df}['Family_Size'] + 1e-6)",
    "rationale": "Normalizes income by household size."
  }},
  {{
    "name": "Is_Weekend",
    "expression": "(pd.to_datetime({df}['Transaction_Date']).dt.dayofweek >= 5).astype(int)",
    "rationale": "Captures weekly behavior patterns."
  }}
]

### YOUR RESPONSE (JSON ONLY):
"#
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        Dataset::new(vec![
            Column::from_f64("rooms", &[3.0, 4.0, 2.0, 5.0, 3.0, 6.0]),
            Column::from_strs("city", &["Oslo", "Bergen, Vest", "Oslo", "Bodø", "Oslo", "Oslo"]),
            Column::from_f64("price", &[410.0, 530.0, 290.0, 640.0, 400.0, 720.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_sample_excludes_target_and_limits_rows() {
        let dataset = dataset();
        let request = SuggestionRequest::new(&dataset, "price", "Housing");
        let sample = sample_csv(&request).unwrap();
        assert_eq!(
            sample,
            "rooms,city\n3,Oslo\n4,\"Bergen, Vest\"\n2,Oslo\n5,Bodø\n3,Oslo\n"
        );
    }

    #[test]
    fn test_schema_marks_target() {
        let dataset = dataset();
        let request = SuggestionRequest::new(&dataset, "price", "Housing");
        assert_eq!(
            schema_lines(&request),
            "- rooms: numeric\n- city: text\n- price: numeric (target, never reference)\n"
        );
    }

    #[test]
    fn test_prompt_sections() {
        let dataset = dataset();
        let request = SuggestionRequest::new(&dataset, "price", "Apartment listings")
            .with_feature_count(5);
        let prompt = build_prompt(&request).unwrap();

        assert!(prompt.contains("**Dataset Description**: Apartment listings"));
        assert!(prompt.contains("Suggest 5 high-impact new features"));
        assert!(prompt.contains("never reference the target column `price`"));
        assert!(prompt.contains("`import`"));
        assert!(!prompt.contains("410"));
        assert!(prompt.ends_with("### YOUR RESPONSE (JSON ONLY):\n"));
    }
}
