//! Canonical records produced by the row normalizer.

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::problem::{RowProblem, line_number};

/// A typed canonical value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CanonicalValue {
    Text(String),
    Number(f64),
    /// Amount rounded to two decimals.
    Currency(f64),
    Date(NaiveDate),
}

impl CanonicalValue {
    /// Numeric value of a number or currency.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CanonicalValue::Number(n) | CanonicalValue::Currency(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CanonicalValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Literal text form used by text output formats.
    pub fn render(&self) -> String {
        match self {
            CanonicalValue::Text(s) => s.clone(),
            CanonicalValue::Number(n) => n.to_string(),
            CanonicalValue::Currency(n) => format!("{:.2}", n),
            CanonicalValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Per-field outcome for one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStatus {
    /// Value coerced successfully.
    Valid,
    /// Optional field with no value.
    Empty,
    /// Required field with no value.
    Missing,
    /// Value present but not coercible.
    Invalid,
}

impl FieldStatus {
    /// True unless the field produced a problem.
    pub fn passed(&self) -> bool {
        matches!(self, FieldStatus::Valid | FieldStatus::Empty)
    }
}

/// One input row in canonical form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Zero-based data row index in the source table.
    pub row: usize,
    /// One-based sheet line.
    pub line: usize,
    /// Canonical values in schema order, followed by derived columns.
    pub values: IndexMap<String, Option<CanonicalValue>>,
    /// Pass/fail per canonical field.
    pub status: IndexMap<String, FieldStatus>,
    /// Problems found in this row.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub problems: Vec<RowProblem>,
}

impl CanonicalRecord {
    pub fn new(row: usize) -> Self {
        Self::at_line(row, line_number(row))
    }

    /// Record for a row read from an explicit sheet line.
    pub fn at_line(row: usize, line: usize) -> Self {
        Self {
            row,
            line,
            values: IndexMap::new(),
            status: IndexMap::new(),
            problems: Vec::new(),
        }
    }

    /// Value of a canonical or derived column.
    pub fn get(&self, column: &str) -> Option<&CanonicalValue> {
        self.values.get(column).and_then(Option::as_ref)
    }

    /// Status of a canonical field.
    pub fn status_of(&self, field: &str) -> Option<FieldStatus> {
        self.status.get(field).copied()
    }

    /// Returns true if the row has no problems.
    pub fn is_valid(&self) -> bool {
        self.problems.is_empty()
    }

    pub(crate) fn set(&mut self, column: &str, value: Option<CanonicalValue>, status: FieldStatus) {
        self.values.insert(column.to_string(), value);
        self.status.insert(column.to_string(), status);
    }

    pub(crate) fn set_derived(&mut self, column: &str, value: Option<CanonicalValue>) {
        self.values.insert(column.to_string(), value);
    }
}
