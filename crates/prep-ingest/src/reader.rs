//! CSV file reading into a [`Dataset`].

use std::io::Cursor;
use std::path::Path;

use polars::prelude::{
    Column as FrameColumn, CsvReadOptions, DataFrame, DataType as FrameType, SerReader,
};
use prep_model::{Column, ColumnData, Dataset, parse_datetime};
use tracing::{debug, info, warn};

use crate::error::{IngestError, Result};

/// Maximum file size for CSV loading (500 MB default).
pub const MAX_CSV_FILE_SIZE: u64 = 500 * 1024 * 1024;

/// Non-null values sampled when deciding whether a text column holds dates.
pub const DATE_SAMPLE_SIZE: usize = 10;

/// Rows used by polars to infer column types.
const INFER_SCHEMA_ROWS: usize = 100;

fn io_error(path: &Path, e: std::io::Error) -> IngestError {
    if e.kind() == std::io::ErrorKind::NotFound {
        IngestError::FileNotFound {
            path: path.to_path_buf(),
        }
    } else {
        IngestError::FileRead {
            path: path.to_path_buf(),
            source: e,
        }
    }
}

/// Check file size against a custom limit.
pub fn check_file_size_with_limit(path: &Path, max_size: u64) -> Result<()> {
    let metadata = std::fs::metadata(path).map_err(|e| io_error(path, e))?;
    if metadata.len() > max_size {
        return Err(IngestError::FileTooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            max_size,
        });
    }
    Ok(())
}

/// Rejects any extension other than `.csv` (case-insensitive).
pub fn check_format(path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    if extension == "csv" {
        Ok(())
    } else {
        Err(IngestError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension,
        })
    }
}

/// Reads the file as text, falling back to Latin-1 when it is not UTF-8.
fn read_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| io_error(path, e))?;
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            warn!(path = %path.display(), "file is not valid UTF-8, decoding as Latin-1");
            err.into_bytes().into_iter().map(char::from).collect()
        }
    };
    Ok(match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    })
}

/// Reads a CSV file into a Polars DataFrame.
pub fn read_csv_frame(path: &Path) -> Result<DataFrame> {
    check_format(path)?;
    check_file_size_with_limit(path, MAX_CSV_FILE_SIZE)?;
    let text = read_text(path)?;
    if text.trim().is_empty() {
        return Err(IngestError::EmptyCsv {
            path: path.to_path_buf(),
        });
    }

    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .into_reader_with_file_handle(Cursor::new(text.into_bytes()))
        .finish()
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Validate DataFrame shape after loading.
///
/// Checks for:
/// - No columns
/// - Empty column names
/// - No data rows
pub fn validate_frame_shape(df: &DataFrame, path: &Path) -> Result<()> {
    if df.width() == 0 {
        return Err(IngestError::NoColumns {
            path: path.to_path_buf(),
        });
    }
    for (index, name) in df.get_column_names().iter().enumerate() {
        if name.trim().is_empty() {
            return Err(IngestError::EmptyColumnName {
                path: path.to_path_buf(),
                index,
            });
        }
    }
    if df.height() == 0 {
        return Err(IngestError::NoRows {
            path: path.to_path_buf(),
        });
    }
    if df.width() > 500 {
        warn!(
            path = %path.display(),
            columns = df.width(),
            "Dataset has more than 500 columns - may impact performance"
        );
    }
    Ok(())
}

/// Converts one polars column into typed column storage.
///
/// Integer and float columns become numeric (non-finite values are nulls),
/// booleans stay boolean and everything else is read as trimmed text.
pub fn convert_column(col: &FrameColumn) -> Result<ColumnData> {
    let series = col.as_materialized_series();
    let data = match series.dtype() {
        FrameType::Boolean => ColumnData::Boolean(series.bool()?.into_iter().collect()),
        FrameType::Int8
        | FrameType::Int16
        | FrameType::Int32
        | FrameType::Int64
        | FrameType::UInt8
        | FrameType::UInt16
        | FrameType::UInt32
        | FrameType::UInt64
        | FrameType::Float32
        | FrameType::Float64 => {
            let cast = series.cast(&FrameType::Float64)?;
            ColumnData::Numeric(
                cast.f64()?
                    .into_iter()
                    .map(|v| v.filter(|x| x.is_finite()))
                    .collect(),
            )
        }
        _ => {
            let cast = series.cast(&FrameType::String)?;
            ColumnData::Text(
                cast.str()?
                    .into_iter()
                    .map(|v| {
                        v.map(str::trim)
                            .filter(|s| !s.is_empty())
                            .map(str::to_string)
                    })
                    .collect(),
            )
        }
    };
    Ok(data)
}

/// Converts a text column to datetimes when its leading values are dates.
///
/// The first [`DATE_SAMPLE_SIZE`] non-null values must all parse. The whole
/// column is then converted and values that do not parse become nulls. A
/// column without any value is left as text.
pub fn detect_dates(data: ColumnData) -> ColumnData {
    let ColumnData::Text(values) = data else {
        return data;
    };
    let mut sample = values.iter().flatten().take(DATE_SAMPLE_SIZE).peekable();
    if sample.peek().is_none() || !sample.all(|v| parse_datetime(v).is_some()) {
        return ColumnData::Text(values);
    }
    ColumnData::Datetime(
        values
            .iter()
            .map(|v| v.as_deref().and_then(parse_datetime))
            .collect(),
    )
}

/// Builds a dataset from a DataFrame, detecting date columns.
pub fn frame_to_dataset(df: &DataFrame) -> Result<Dataset> {
    let mut columns = Vec::with_capacity(df.width());
    for col in df.get_columns() {
        let name = col.name().to_string();
        let data = detect_dates(convert_column(col)?);
        if matches!(data, ColumnData::Datetime(_)) {
            debug!(column = %name, "parsed column as dates");
        }
        columns.push(Column::new(name, data));
    }
    Ok(Dataset::new(columns)?)
}

/// Reads a `.csv` file into a dataset.
pub fn read_dataset(path: &Path) -> Result<Dataset> {
    let df = read_csv_frame(path)?;
    validate_frame_shape(&df, path)?;
    let dataset = frame_to_dataset(&df)?;
    info!(
        path = %path.display(),
        rows = dataset.height(),
        columns = dataset.width(),
        "dataset loaded"
    );
    Ok(dataset)
}
