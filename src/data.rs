//! Snapshot loading and dataset profiling using Polars

use std::path::Path;

use polars::prelude::*;
use tracing::{debug, info};

use crate::error::{AnalysisError, Result};

pub const HOTEL_NAME: &str = "Hotel Name";
pub const CHECKIN_DATE: &str = "Checkin Date";
pub const SNAPSHOT_DATE: &str = "Snapshot Date";
pub const ORIGINAL_PRICE: &str = "Original Price";
pub const DISCOUNT_PRICE: &str = "Discount Price";
pub const AVAILABLE_ROOMS: &str = "Available Rooms";
pub const DISCOUNT_CODE: &str = "Discount Code";
pub const HOTEL_STARS: &str = "Hotel Stars";

/// Columns every snapshot dataset must carry.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    ORIGINAL_PRICE,
    DISCOUNT_PRICE,
    AVAILABLE_ROOMS,
    HOTEL_NAME,
    CHECKIN_DATE,
    SNAPSHOT_DATE,
    DISCOUNT_CODE,
    HOTEL_STARS,
];

/// Number of rows shown in table previews.
pub const PREVIEW_ROWS: usize = 5;

/// Name, dtype and null count of one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    pub dtype: String,
    pub nulls: usize,
}

/// Descriptive statistics of a numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub name: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub median: Option<f64>,
    pub max: Option<f64>,
}

/// Overview of a freshly loaded dataset, printed before any cleaning.
#[derive(Debug, Clone)]
pub struct DatasetProfile {
    pub rows: usize,
    pub width: usize,
    pub head: DataFrame,
    pub columns: Vec<ColumnInfo>,
    pub numeric: Vec<ColumnSummary>,
}

/// Load the snapshot CSV with inferred column types.
///
/// # Arguments
/// * `path` - Path to the CSV file (header row required)
///
/// # Returns
/// * The raw table, unmodified apart from type inference
pub fn load_snapshots(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(AnalysisError::InputNotFound {
            path: path.to_path_buf(),
        });
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| AnalysisError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .finish()
        .map_err(|e| AnalysisError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    require_columns(&df, &REQUIRED_COLUMNS)?;

    if df.height() == 0 {
        return Err(AnalysisError::EmptyDataset { stage: "loading" });
    }

    info!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "loaded snapshot dataset"
    );
    Ok(df)
}

/// Fail with `MissingColumn` for the first absent column.
pub fn require_columns(df: &DataFrame, columns: &[&str]) -> Result<()> {
    for name in columns {
        if df.column(name).is_err() {
            return Err(AnalysisError::MissingColumn {
                column: (*name).to_string(),
            });
        }
    }
    Ok(())
}

/// Whether a column holds integers or floats.
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Build shape, dtype, null and summary-statistics views of a table.
pub fn profile(df: &DataFrame) -> Result<DatasetProfile> {
    let mut columns = Vec::with_capacity(df.width());
    let mut numeric = Vec::new();

    for column in df.get_columns() {
        columns.push(ColumnInfo {
            name: column.name().to_string(),
            dtype: column.dtype().to_string(),
            nulls: column.null_count(),
        });
        if is_numeric_dtype(column.dtype()) {
            numeric.push(summarize_column(column)?);
        }
    }

    debug!(numeric_columns = numeric.len(), "profiled dataset");

    Ok(DatasetProfile {
        rows: df.height(),
        width: df.width(),
        head: df.head(Some(PREVIEW_ROWS)),
        columns,
        numeric,
    })
}

fn summarize_column(column: &Column) -> Result<ColumnSummary> {
    let values = column.cast(&DataType::Float64)?;
    let ca = values.f64()?;
    Ok(ColumnSummary {
        name: column.name().to_string(),
        count: ca.len() - ca.null_count(),
        mean: ca.mean(),
        std: ca.std(1),
        min: ca.min(),
        median: ca.median(),
        max: ca.max(),
    })
}

/// Read a column as `f64` values, casting non-float columns first.
pub fn column_f64(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let values = df.column(name)?.cast(&DataType::Float64)?;
    Ok(values.f64()?.into_iter().collect())
}

/// Read a column as owned strings, casting non-string columns first.
pub fn column_string(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let values = df.column(name)?.cast(&DataType::String)?;
    Ok(values
        .str()?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Snapshot ID,Snapshot Date,Checkin Date,Days,Original Price,Discount Price,Discount Code,Available Rooms,Hotel Name,Hotel Stars").unwrap();
        writeln!(file, "1,2024-01-01,2024-01-10,9,200,180,1,10,Grand Plaza,4").unwrap();
        writeln!(file, "2,2024-01-02,2024-01-10,8,200,170,2,-1,Grand Plaza,4").unwrap();
        writeln!(file, "3,2024-01-01,2024-01-12,11,120,,1,6,Harbor Inn,3").unwrap();
        file
    }

    #[test]
    fn test_load_snapshots() {
        let file = create_test_csv();
        let df = load_snapshots(file.path()).unwrap();

        assert_eq!(df.shape(), (3, 10));
        assert_eq!(df.column(AVAILABLE_ROOMS).unwrap().null_count(), 0);
        assert_eq!(df.column(DISCOUNT_PRICE).unwrap().null_count(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_snapshots(Path::new("does/not/exist.csv"));
        assert!(matches!(result, Err(AnalysisError::InputNotFound { .. })));
    }

    #[test]
    fn test_load_missing_required_column() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Hotel Name,Original Price").unwrap();
        writeln!(file, "Grand Plaza,200").unwrap();

        let result = load_snapshots(file.path());
        assert!(matches!(result, Err(AnalysisError::MissingColumn { .. })));
    }

    #[test]
    fn test_profile() {
        let file = create_test_csv();
        let df = load_snapshots(file.path()).unwrap();
        let profile = profile(&df).unwrap();

        assert_eq!(profile.rows, 3);
        assert_eq!(profile.width, 10);
        assert_eq!(profile.head.height(), 3);

        let price = profile
            .columns
            .iter()
            .find(|c| c.name == DISCOUNT_PRICE)
            .unwrap();
        assert_eq!(price.nulls, 1);

        let original = profile
            .numeric
            .iter()
            .find(|s| s.name == ORIGINAL_PRICE)
            .unwrap();
        assert_eq!(original.count, 3);
        assert_eq!(original.max, Some(200.0));
        assert_eq!(original.median, Some(200.0));
        assert!(profile.numeric.iter().all(|s| s.name != HOTEL_NAME));
    }
}
