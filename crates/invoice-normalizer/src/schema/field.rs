//! Canonical and derived field definitions.

use serde::{Deserialize, Serialize};

use super::types::FieldType;

/// A canonical target field the output file must contain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Canonical field name (record key).
    pub name: String,
    /// Column title in the output file (defaults to `name`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Declared data type.
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    /// Whether every row must carry a value.
    #[serde(default)]
    pub required: bool,
    /// Known alternate header spellings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

impl FieldSpec {
    /// Create an optional field with no aliases.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            field_type,
            required: false,
            aliases: Vec::new(),
        }
    }

    /// Mark the field as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the output column title.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Set the header aliases.
    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    /// Column title used in the output file.
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// Every spelling a header is compared against: the name, the display
    /// name, then the aliases.
    pub fn match_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str())
            .chain(self.display_name.as_deref())
            .chain(self.aliases.iter().map(String::as_str))
    }
}

/// How a derived column is computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DerivedKind {
    /// Customs unit of measure looked up from an HS code field.
    CustomsUnit { source: String },
    /// Quantity converted into customs units: `quantity / factor(unit)`.
    CustomsQuantity { quantity: String, unit: String },
}

/// A column computed from other columns instead of read from the upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedFieldSpec {
    /// Derived column name.
    pub name: String,
    /// Column title in the output file (defaults to `name`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Computation.
    #[serde(flatten)]
    pub kind: DerivedKind,
}

impl DerivedFieldSpec {
    pub fn new(name: impl Into<String>, kind: DerivedKind) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            kind,
        }
    }

    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// Names of the columns this one reads.
    pub fn sources(&self) -> Vec<&str> {
        match &self.kind {
            DerivedKind::CustomsUnit { source } => vec![source.as_str()],
            DerivedKind::CustomsQuantity { quantity, unit } => {
                vec![quantity.as_str(), unit.as_str()]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_names_include_name_and_display() {
        let field = FieldSpec::new("qty", FieldType::Number)
            .with_display_name("Quantity")
            .with_aliases(["Qty", "Pcs"]);

        let names: Vec<&str> = field.match_names().collect();
        assert_eq!(names, vec!["qty", "Quantity", "Qty", "Pcs"]);
        assert_eq!(field.display_name(), "Quantity");
    }

    #[test]
    fn test_field_spec_json_shape() {
        let json = r#"{"name": "Total", "type": "currency", "required": true, "aliases": ["Amount"]}"#;
        let field: FieldSpec = serde_json::from_str(json).unwrap();

        assert_eq!(field.field_type, FieldType::Currency);
        assert!(field.required);
        assert_eq!(field.display_name(), "Total");
    }

    #[test]
    fn test_derived_kind_is_tagged() {
        let json = r#"{"name": "Customs Quantity", "kind": "customs_quantity", "quantity": "Qty", "unit": "UOM"}"#;
        let derived: DerivedFieldSpec = serde_json::from_str(json).unwrap();

        assert_eq!(derived.sources(), vec!["Qty", "UOM"]);
    }
}
