//! In-memory table representation and source metadata.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::StructuralError;

static EMPTY_CELL: CellValue = CellValue::Empty;

/// A single spreadsheet cell as read from the uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    /// No value.
    Empty,
    /// Text as entered by the client.
    Text(String),
    /// Numeric cell.
    Number(f64),
    /// Boolean cell.
    Bool(bool),
    /// Date-formatted cell with no time component.
    Date(NaiveDate),
    /// Date-formatted cell with a time component.
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// Returns true for empty cells and text that only encodes "no value".
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => RawTable::is_null_value(s),
            _ => false,
        }
    }

    /// Build a cell from delimited text, mapping blank strings to `Empty`.
    pub fn from_text(s: &str) -> Self {
        if s.trim().is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s.to_string())
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// Metadata about an ingested file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name as supplied by the uploader.
    pub file: String,
    /// SHA-256 hash of the file contents.
    pub hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Detected format (xlsx, xls, csv, tsv, ...).
    pub format: String,
    /// Number of data rows (excluding header).
    pub row_count: usize,
    /// Number of columns.
    pub column_count: usize,
    /// When the file was read.
    pub read_at: DateTime<Utc>,
}

impl SourceMetadata {
    /// Create metadata for a file that has been read into `table`.
    pub fn new(
        file: impl Into<String>,
        contents: &[u8],
        format: impl Into<String>,
        table: &RawTable,
    ) -> Self {
        Self {
            file: file.into(),
            hash: content_hash(contents),
            size_bytes: contents.len() as u64,
            format: format.into(),
            row_count: table.row_count(),
            column_count: table.column_count(),
            read_at: Utc::now(),
        }
    }
}

/// SHA-256 of `contents`, prefixed with the algorithm name.
pub fn content_hash(contents: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(contents);
    format!("sha256:{:x}", hasher.finalize())
}

/// Parsed tabular data: one header row plus data rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    /// Column headers, left to right.
    pub headers: Vec<String>,
    /// Row data (row-major order). Rows may be shorter than `headers`.
    pub rows: Vec<Vec<CellValue>>,
    /// One-based sheet line of each row. Empty when rows follow the header
    /// with nothing skipped.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<usize>,
}

impl RawTable {
    /// Create a new table.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            headers,
            rows,
            lines: Vec::new(),
        }
    }

    /// Record the sheet line each row was read from.
    pub fn with_lines(mut self, lines: Vec<usize>) -> Self {
        self.lines = lines;
        self
    }

    /// Build a table from string rows, as delimited text would produce.
    pub fn from_strings<H, R, C>(headers: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        let headers = headers.into_iter().map(Into::into).collect();
        let rows = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cell| CellValue::from_text(cell.as_ref()))
                    .collect()
            })
            .collect();
        Self::new(headers, rows)
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Get the number of rows (excluding header).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get a specific cell; cells past the end of a short row are empty.
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY_CELL)
    }

    /// One-based sheet line of a data row, counting the header as line 1
    /// unless the reader recorded otherwise.
    pub fn line(&self, row: usize) -> usize {
        self.lines.get(row).copied().unwrap_or(row + 2)
    }

    /// Get all values for a column by index.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &CellValue> {
        (0..self.rows.len()).map(move |row| self.cell(row, index))
    }

    /// Check that the table has a usable header row.
    pub fn check_structure(&self) -> std::result::Result<(), StructuralError> {
        if self.headers.is_empty() {
            return Err(StructuralError::NoColumns);
        }
        if self.headers.iter().all(|h| h.trim().is_empty()) {
            return Err(StructuralError::BlankHeaders(self.headers.len()));
        }
        Ok(())
    }

    /// Check if a value represents a missing/null value.
    pub fn is_null_value(value: &str) -> bool {
        let trimmed = value.trim();
        trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case("na")
            || trimmed.eq_ignore_ascii_case("n/a")
            || trimmed.eq_ignore_ascii_case("null")
            || trimmed.eq_ignore_ascii_case("none")
            || trimmed.eq_ignore_ascii_case("nil")
            || trimmed == "."
            || trimmed == "-"
    }
}
