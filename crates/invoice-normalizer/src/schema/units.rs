//! Customs unit-of-measure table.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Maps HS code prefixes to customs units, and units to quantity factors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitTable {
    /// Unit used when no prefix matches.
    #[serde(default = "default_unit")]
    pub default_unit: String,
    /// HS code prefix (digits only) to unit abbreviation.
    #[serde(default)]
    pub prefixes: IndexMap<String, String>,
    /// Invoice units per customs unit (DOZ = 12 pieces).
    #[serde(default = "default_factors")]
    pub factors: IndexMap<String, f64>,
}

fn default_unit() -> String {
    "NUM".to_string()
}

fn default_factors() -> IndexMap<String, f64> {
    [("DOZ", 12.0), ("NUM", 1.0), ("KG", 1.0), ("LBS", 1.0)]
        .into_iter()
        .map(|(unit, factor)| (unit.to_string(), factor))
        .collect()
}

impl UnitTable {
    /// Look up the unit for an HS code by longest matching prefix.
    ///
    /// Dots and spaces in the code are ignored, so `6109.10.0010` and
    /// `6109100010` resolve the same way.
    pub fn lookup(&self, hs_code: &str) -> Option<&str> {
        let digits = hs_digits(hs_code);
        if digits.is_empty() {
            return None;
        }
        self.prefixes
            .iter()
            .filter(|(prefix, _)| digits.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, unit)| unit.as_str())
    }

    /// Factor for converting invoice quantity into `unit`; unknown units are 1.
    pub fn factor(&self, unit: &str) -> f64 {
        self.factors
            .get(&unit.to_ascii_uppercase())
            .copied()
            .filter(|f| *f > 0.0)
            .unwrap_or(1.0)
    }
}

impl Default for UnitTable {
    fn default() -> Self {
        let prefixes = [("61", "DOZ"), ("62", "DOZ")]
            .into_iter()
            .map(|(p, u)| (p.to_string(), u.to_string()))
            .collect();
        Self {
            default_unit: default_unit(),
            prefixes,
            factors: default_factors(),
        }
    }
}

/// Keep only the ASCII digits of an HS code.
pub(crate) fn hs_digits(hs_code: &str) -> String {
    hs_code.chars().filter(|c| c.is_ascii_digit()).collect()
}
