//! Error types for the invoice normalizer.

use std::path::PathBuf;
use thiserror::Error;

/// Reasons a table cannot be processed at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    /// The sheet has no header row.
    #[error("no header row found")]
    EmptyHeaderRow,

    /// The header row has zero columns.
    #[error("header row has no columns")]
    NoColumns,

    /// Every header cell is blank.
    #[error("all {0} header cells are blank")]
    BlankHeaders(usize),

    /// The workbook opened but its first sheet could not be read.
    #[error("unreadable sheet: {0}")]
    UnreadableSheet(String),
}

/// Main error type for normalizer operations.
#[derive(Debug, Error)]
pub enum NormalizerError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The table is structurally unusable.
    #[error("Structural error: {0}")]
    Structural(#[from] StructuralError),

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error opening or reading a workbook.
    #[error("Excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// Error writing the output workbook.
    #[error("Workbook write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// File format not supported.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Empty file or no data to process.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Schema or pipeline configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Mapping advisor failure (HTTP, API or response parsing).
    #[error("Advisor error: {0}")]
    Advisor(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for normalizer operations.
pub type Result<T> = std::result::Result<T, NormalizerError>;
