//! CSV export of a dataset.

use std::path::Path;

use prep_model::Dataset;
use tracing::info;

use crate::error::{IngestError, Result};

/// Writes `dataset` to `path` as CSV with a header row.
///
/// Nulls are written as empty fields, dates as `YYYY-MM-DD` (with a time
/// part when it is not midnight) and integral numbers without a fraction.
pub fn write_dataset(dataset: &Dataset, path: &Path) -> Result<()> {
    let write_err = |message: String| IngestError::Write {
        path: path.to_path_buf(),
        message,
    };

    let mut writer = csv::Writer::from_path(path).map_err(|e| write_err(e.to_string()))?;
    writer
        .write_record(dataset.column_names())
        .map_err(|e| write_err(e.to_string()))?;

    for row in 0..dataset.height() {
        let record: Vec<String> = dataset
            .columns()
            .iter()
            .map(|c| c.data().get(row).to_string())
            .collect();
        writer
            .write_record(&record)
            .map_err(|e| write_err(e.to_string()))?;
    }
    writer.flush().map_err(|e| write_err(e.to_string()))?;

    info!(
        path = %path.display(),
        rows = dataset.height(),
        columns = dataset.width(),
        "dataset written"
    );
    Ok(())
}
