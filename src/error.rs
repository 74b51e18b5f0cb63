//! Error types for the discount analysis pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while running any pipeline stage.
#[derive(Debug, Error)]
pub enum AnalysisError {
    // === Input Errors ===
    /// Input CSV file does not exist.
    #[error("input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// Input CSV could not be read or parsed.
    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// A column the analysis depends on is absent.
    #[error("required column '{column}' not found")]
    MissingColumn { column: String },

    /// A stage received (or produced) a table with no rows.
    #[error("no rows left after {stage}")]
    EmptyDataset { stage: &'static str },

    /// Snapshot date in none of the accepted layouts.
    #[error("unrecognized snapshot date '{value}'")]
    InvalidSnapshotDate { value: String },

    // === Modelling Errors ===
    /// Fewer hotels than requested clusters.
    #[error("cannot form {clusters} clusters from {hotels} hotels")]
    TooFewHotels { hotels: usize, clusters: usize },

    /// Model fitting failed inside linfa.
    #[error("model fitting failed: {message}")]
    Model { message: String },

    // === Output Errors ===
    /// Chart rendering failed.
    #[error("failed to render chart {path}: {message}")]
    Render { path: PathBuf, message: String },

    /// Could not create the chart directory.
    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === DataFrame Errors ===
    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for AnalysisError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

impl From<ndarray::ShapeError> for AnalysisError {
    fn from(err: ndarray::ShapeError) -> Self {
        Self::Model {
            message: err.to_string(),
        }
    }
}

/// Result type for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;
