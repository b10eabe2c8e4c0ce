//! The full target schema and its default invoice layout.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};

use super::field::{DerivedFieldSpec, DerivedKind, FieldSpec};
use super::types::FieldType;
use super::units::UnitTable;
use crate::error::{NormalizerError, Result};

/// Excel's worksheet name limit.
const MAX_SHEET_NAME_LEN: usize = 31;

/// Characters Excel refuses in worksheet names.
const INVALID_SHEET_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// Immutable description of the output the receiving department expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSchema {
    /// Schema name, for reports.
    pub name: String,
    /// Canonical fields in declaration order (also the tie-break order).
    pub fields: Vec<FieldSpec>,
    /// Columns computed from canonical fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub derived: Vec<DerivedFieldSpec>,
    /// Fixed output column order by name. Empty means fields then derived.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_columns: Vec<String>,
    /// Accepted date formats (chrono strftime syntax), tried in order.
    #[serde(default = "default_date_formats")]
    pub date_formats: Vec<String>,
    /// Customs unit lookup for derived customs columns.
    #[serde(default)]
    pub units: UnitTable,
    /// Worksheet name in the output workbook.
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,
}

fn default_date_formats() -> Vec<String> {
    [
        "%Y-%m-%d",
        "%Y/%m/%d",
        "%m/%d/%Y",
        "%d.%m.%Y",
        "%d-%b-%Y",
        "%d %b %Y",
        "%b %d, %Y",
        "%B %d, %Y",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_sheet_name() -> String {
    "Sheet1".to_string()
}

impl TargetSchema {
    /// Create a schema with the given fields and default settings.
    pub fn new(name: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            name: name.into(),
            fields,
            derived: Vec::new(),
            output_columns: Vec::new(),
            date_formats: default_date_formats(),
            units: UnitTable::default(),
            sheet_name: default_sheet_name(),
        }
    }

    /// Add a derived column.
    pub fn with_derived(mut self, derived: DerivedFieldSpec) -> Self {
        self.derived.push(derived);
        self
    }

    /// Fix the output column order.
    pub fn with_output_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// The export department's standard invoice layout.
    pub fn invoice_default() -> Self {
        let fields = vec![
            FieldSpec::new("Export Invoice #", FieldType::String)
                .required()
                .with_aliases([
                    "Export Invoice #",
                    "Export Document",
                    "Export Invoice Number",
                    "Invoice No",
                    "Invoice Number",
                ]),
            FieldSpec::new("Style", FieldType::String)
                .required()
                .with_aliases([
                    "Style",
                    "Item",
                    "Product Style",
                    "Style/Item/Style/Product Style",
                    "Product Code",
                    "Style Code",
                ]),
            FieldSpec::new("Description", FieldType::String)
                .required()
                .with_aliases([
                    "Description",
                    "Item Description",
                    "Product Description",
                    "desc",
                    "product_desc",
                    "item_description",
                ]),
            FieldSpec::new("Invoice Quantity", FieldType::Number)
                .required()
                .with_aliases(["Quantity", "QTY", "Invoice Qty", "Qty"]),
            FieldSpec::new("Total Amount", FieldType::Currency)
                .required()
                .with_aliases(["Total Amount", "Amount US$", "Amount", "Total", "total_price"]),
            FieldSpec::new("HS Code", FieldType::String)
                .required()
                .with_aliases(["HS Code", "Customs Nomenclature", "Tariff Code"]),
        ];

        Self::new("export-invoice", fields)
            .with_derived(DerivedFieldSpec::new(
                "Customs Unit of Measure",
                DerivedKind::CustomsUnit {
                    source: "HS Code".to_string(),
                },
            ))
            .with_derived(DerivedFieldSpec::new(
                "Customs Quantity",
                DerivedKind::CustomsQuantity {
                    quantity: "Invoice Quantity".to_string(),
                    unit: "Customs Unit of Measure".to_string(),
                },
            ))
            .with_output_columns([
                "Export Invoice #",
                "Style",
                "Description",
                "Invoice Quantity",
                "Total Amount",
                "Customs Unit of Measure",
                "Customs Quantity",
                "HS Code",
            ])
    }

    /// Parse and validate a schema from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let schema: TargetSchema = serde_json::from_str(json)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Load and validate a schema from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| NormalizerError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json_str(&text)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(config_error("schema has no fields"));
        }

        let mut names = HashSet::new();
        for name in self.all_names() {
            if name.trim().is_empty() {
                return Err(config_error("field names must not be blank"));
            }
            if !names.insert(name) {
                return Err(config_error(format!("duplicate field name '{}'", name)));
            }
        }

        for derived in &self.derived {
            self.validate_derived(derived)?;
        }

        let mut seen = HashSet::new();
        for column in &self.output_columns {
            if !names.contains(column.as_str()) {
                return Err(config_error(format!("unknown output column '{}'", column)));
            }
            if !seen.insert(column.as_str()) {
                return Err(config_error(format!("output column '{}' listed twice", column)));
            }
        }

        if self.date_formats.is_empty() {
            return Err(config_error("at least one date format is required"));
        }
        for fmt in &self.date_formats {
            if StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error)) {
                return Err(config_error(format!("invalid date format '{}'", fmt)));
            }
        }

        if self.sheet_name.is_empty() || self.sheet_name.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(config_error(format!(
                "sheet name must be 1-{} characters",
                MAX_SHEET_NAME_LEN
            )));
        }
        if self.sheet_name.contains(INVALID_SHEET_CHARS) {
            return Err(config_error(format!(
                "sheet name '{}' cannot contain any of [ ] : * ? / \\",
                self.sheet_name
            )));
        }
        if self.sheet_name.starts_with('\'') || self.sheet_name.ends_with('\'') {
            return Err(config_error(format!(
                "sheet name '{}' cannot start or end with an apostrophe",
                self.sheet_name
            )));
        }

        Ok(())
    }

    fn validate_derived(&self, derived: &DerivedFieldSpec) -> Result<()> {
        match &derived.kind {
            DerivedKind::CustomsUnit { source } => {
                if self.field(source).is_none() {
                    return Err(config_error(format!(
                        "'{}' reads unknown field '{}'",
                        derived.name, source
                    )));
                }
            }
            DerivedKind::CustomsQuantity { quantity, unit } => {
                match self.field(quantity) {
                    Some(f) if f.field_type.is_numeric() => {}
                    _ => {
                        return Err(config_error(format!(
                            "'{}' needs a numeric quantity field, got '{}'",
                            derived.name, quantity
                        )));
                    }
                }
                let unit_known = self.field(unit).is_some()
                    || self.derived.iter().any(|d| {
                        d.name == *unit && matches!(d.kind, DerivedKind::CustomsUnit { .. })
                    });
                if !unit_known {
                    return Err(config_error(format!(
                        "'{}' reads unknown unit column '{}'",
                        derived.name, unit
                    )));
                }
            }
        }
        Ok(())
    }

    /// Get a canonical field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Get a canonical field's declaration index.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Required canonical fields in declaration order.
    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.required)
    }

    /// Output column names in their fixed order.
    pub fn columns(&self) -> Vec<&str> {
        if self.output_columns.is_empty() {
            self.all_names().collect()
        } else {
            self.output_columns.iter().map(String::as_str).collect()
        }
    }

    /// Output column title for a canonical or derived column.
    pub fn display_name(&self, column: &str) -> Option<&str> {
        if let Some(field) = self.field(column) {
            return Some(field.display_name());
        }
        self.derived
            .iter()
            .find(|d| d.name == column)
            .map(|d| d.display_name())
    }

    fn all_names(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .map(|f| f.name.as_str())
            .chain(self.derived.iter().map(|d| d.name.as_str()))
    }
}

impl Default for TargetSchema {
    fn default() -> Self {
        Self::invoice_default()
    }
}

fn config_error(message: impl Into<String>) -> NormalizerError {
    NormalizerError::Config(message.into())
}
