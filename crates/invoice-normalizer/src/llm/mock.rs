//! Mock advisor for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{NormalizerError, Result};
use crate::matching::MappingSuggestion;
use crate::schema::FieldSpec;

use super::provider::{MappingAdvisor, validate_unit};

/// Advisor that returns canned answers and counts how often it was asked.
#[derive(Debug, Default)]
pub struct MockAdvisor {
    suggestions: Vec<MappingSuggestion>,
    units: HashMap<String, String>,
    fail: bool,
    mapping_calls: AtomicUsize,
    unit_calls: AtomicUsize,
}

impl MockAdvisor {
    /// Create a mock that knows nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a canned header pairing.
    pub fn with_suggestion(
        mut self,
        header: impl Into<String>,
        field: impl Into<String>,
        confidence: f64,
    ) -> Self {
        self.suggestions
            .push(MappingSuggestion::new(header, field, confidence));
        self
    }

    /// Add a canned unit answer for an HS code.
    pub fn with_unit(mut self, hs_code: impl Into<String>, unit: impl Into<String>) -> Self {
        self.units.insert(hs_code.into(), unit.into());
        self
    }

    /// Make every call fail, as an unreachable API would.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Number of `suggest_mappings` calls so far.
    pub fn mapping_calls(&self) -> usize {
        self.mapping_calls.load(Ordering::SeqCst)
    }

    /// Number of `resolve_unit` calls so far.
    pub fn unit_calls(&self) -> usize {
        self.unit_calls.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> Result<()> {
        if self.fail {
            Err(NormalizerError::Advisor("mock advisor unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

impl MappingAdvisor for MockAdvisor {
    fn suggest_mappings(
        &self,
        unassigned_headers: &[String],
        missing_fields: &[&FieldSpec],
    ) -> Result<Vec<MappingSuggestion>> {
        self.mapping_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        Ok(self
            .suggestions
            .iter()
            .filter(|s| unassigned_headers.contains(&s.header))
            .filter(|s| missing_fields.iter().any(|f| f.name == s.field))
            .cloned()
            .collect())
    }

    fn resolve_unit(&self, hs_code: &str) -> Result<Option<String>> {
        self.unit_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        Ok(self.units.get(hs_code).and_then(|u| validate_unit(u)))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldType;

    #[test]
    fn test_only_returns_pairings_for_open_slots() {
        let advisor = MockAdvisor::new()
            .with_suggestion("Menge", "Quantity", 0.9)
            .with_suggestion("Wert", "Total", 0.9);
        let quantity = FieldSpec::new("Quantity", FieldType::Number);

        let suggestions = advisor
            .suggest_mappings(&["Menge".to_string(), "Wert".to_string()], &[&quantity])
            .unwrap();

        assert_eq!(suggestions.len(), 1);
        assert_eq!(advisor.mapping_calls(), 1);
    }

    #[test]
    fn test_units_are_validated() {
        let advisor = MockAdvisor::new()
            .with_unit("8471", "kg")
            .with_unit("9999", "not a unit");

        assert_eq!(advisor.resolve_unit("8471").unwrap(), Some("KG".to_string()));
        assert_eq!(advisor.resolve_unit("9999").unwrap(), None);
        assert_eq!(advisor.resolve_unit("0000").unwrap(), None);
        assert_eq!(advisor.unit_calls(), 3);
    }

    #[test]
    fn test_failing_mock() {
        let advisor = MockAdvisor::failing();
        assert!(advisor.resolve_unit("6109").is_err());
    }
}
