//! Core type definitions for the target schema.

use serde::{Deserialize, Serialize};

/// Declared data type of a canonical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Free text, whitespace-normalized.
    String,
    /// Plain number (quantities, weights).
    Number,
    /// Calendar date.
    Date,
    /// Monetary amount, written without symbol.
    Currency,
}

impl FieldType {
    /// Returns true if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Number | FieldType::Currency)
    }

    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Currency => "currency",
        }
    }
}

impl Default for FieldType {
    fn default() -> Self {
        FieldType::String
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
