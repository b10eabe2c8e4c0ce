//! Row-level data problems.

use serde::{Deserialize, Serialize};

use crate::schema::FieldType;

/// Kind of row-level problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProblemKind {
    /// A required field has no mapped column or an empty cell.
    MissingRequiredField,
    /// The cell could not be coerced into the field's declared type.
    TypeMismatch { raw: String, expected: FieldType },
}

impl ProblemKind {
    /// Short key used when counting problems by kind.
    pub fn key(&self) -> &'static str {
        match self {
            ProblemKind::MissingRequiredField => "missing_required_field",
            ProblemKind::TypeMismatch { .. } => "type_mismatch",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            ProblemKind::MissingRequiredField => "Missing Required Field",
            ProblemKind::TypeMismatch { .. } => "Type Mismatch",
        }
    }
}

/// A problem attributed to one row and one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowProblem {
    /// Zero-based data row index.
    pub row: usize,
    /// One-based line in the source sheet (header is line 1).
    pub line: usize,
    /// Canonical field name.
    pub field: String,
    /// What went wrong.
    #[serde(flatten)]
    pub kind: ProblemKind,
    /// Human-readable description.
    pub message: String,
}

impl RowProblem {
    pub fn missing(row: usize, line: usize, field: impl Into<String>, unmapped: bool) -> Self {
        let field = field.into();
        let message = if unmapped {
            format!("required field '{}' has no matching column", field)
        } else {
            format!("required field '{}' is empty", field)
        };
        Self {
            row,
            line,
            field,
            kind: ProblemKind::MissingRequiredField,
            message,
        }
    }

    pub fn type_mismatch(
        row: usize,
        line: usize,
        field: impl Into<String>,
        raw: impl Into<String>,
        expected: FieldType,
    ) -> Self {
        let field = field.into();
        let raw = raw.into();
        let message = format!("'{}' is not a valid {} for '{}'", raw, expected.label(), field);
        Self {
            row,
            line,
            field,
            kind: ProblemKind::TypeMismatch { raw, expected },
            message,
        }
    }
}

/// Sheet line of a data row, counting the header as line 1.
pub fn line_number(row: usize) -> usize {
    row + 2
}
