//! Derived customs columns: unit of measure and converted quantity.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::llm::{MappingAdvisor, validate_unit};
use crate::normalize::{CanonicalRecord, CanonicalValue};
use crate::schema::{DerivedKind, TargetSchema, UnitTable};

/// Resolves customs units, asking the advisor at most once per HS code.
pub struct UnitResolver<'a> {
    table: &'a UnitTable,
    advisor: Option<&'a dyn MappingAdvisor>,
    cache: HashMap<String, String>,
}

impl<'a> UnitResolver<'a> {
    pub fn new(table: &'a UnitTable, advisor: Option<&'a dyn MappingAdvisor>) -> Self {
        Self {
            table,
            advisor,
            cache: HashMap::new(),
        }
    }

    /// Unit for `hs_code`: table prefix, then advisor, then the table default.
    pub fn resolve(&mut self, hs_code: &str) -> String {
        if let Some(unit) = self.table.lookup(hs_code) {
            return unit.to_string();
        }

        let Some(advisor) = self.advisor else {
            return self.table.default_unit.clone();
        };

        let key = hs_code.trim().to_string();
        if let Some(unit) = self.cache.get(&key) {
            return unit.clone();
        }

        let unit = match advisor.resolve_unit(&key) {
            Ok(Some(answer)) => validate_unit(&answer).unwrap_or_else(|| {
                warn!(hs_code = %key, answer = %answer, "unexpected unit format; using default");
                self.table.default_unit.clone()
            }),
            Ok(None) => self.table.default_unit.clone(),
            Err(e) => {
                warn!(advisor = advisor.name(), hs_code = %key, error = %e, "unit lookup failed");
                self.table.default_unit.clone()
            }
        };
        debug!(hs_code = %key, unit = %unit, "resolved customs unit");

        self.cache.insert(key, unit.clone());
        unit
    }

    /// Distinct HS codes sent to the advisor so far.
    pub fn advisor_lookups(&self) -> usize {
        self.cache.len()
    }
}

/// Fill every derived column of `records`, in schema order.
pub fn apply_derived(
    records: &mut [CanonicalRecord],
    schema: &TargetSchema,
    advisor: Option<&dyn MappingAdvisor>,
) {
    let mut resolver = UnitResolver::new(&schema.units, advisor);

    for derived in &schema.derived {
        for record in records.iter_mut() {
            let value = match &derived.kind {
                DerivedKind::CustomsUnit { source } => record
                    .get(source)
                    .map(text_of)
                    .filter(|code| !code.trim().is_empty())
                    .map(|code| CanonicalValue::Text(resolver.resolve(&code))),
                DerivedKind::CustomsQuantity { quantity, unit } => {
                    let qty = record.get(quantity).and_then(CanonicalValue::as_f64);
                    let unit = record.get(unit).map(text_of);
                    match (qty, unit) {
                        (Some(qty), Some(unit)) => {
                            Some(CanonicalValue::Number(customs_quantity(qty, &unit, &schema.units)))
                        }
                        _ => None,
                    }
                }
            };
            record.set_derived(&derived.name, value);
        }
    }
}

/// Invoice quantity expressed in customs units.
pub fn customs_quantity(invoice_quantity: f64, unit: &str, table: &UnitTable) -> f64 {
    invoice_quantity / table.factor(unit)
}

fn text_of(value: &CanonicalValue) -> String {
    match value {
        CanonicalValue::Text(s) => s.clone(),
        other => other.render(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockAdvisor;
    use crate::normalize::FieldStatus;

    fn record(hs: Option<&str>, qty: Option<f64>) -> CanonicalRecord {
        let mut record = CanonicalRecord::new(0);
        record.set(
            "HS Code",
            hs.map(|s| CanonicalValue::Text(s.to_string())),
            FieldStatus::Valid,
        );
        record.set(
            "Invoice Quantity",
            qty.map(CanonicalValue::Number),
            FieldStatus::Valid,
        );
        record
    }

    #[test]
    fn test_table_units_and_quantities() {
        let schema = TargetSchema::invoice_default();
        let mut records = vec![record(Some("6109.10"), Some(24.0)), record(Some("8471"), Some(5.0))];

        apply_derived(&mut records, &schema, None);

        assert_eq!(
            records[0].get("Customs Unit of Measure"),
            Some(&CanonicalValue::Text("DOZ".into()))
        );
        assert_eq!(records[0].get("Customs Quantity"), Some(&CanonicalValue::Number(2.0)));
        assert_eq!(
            records[1].get("Customs Unit of Measure"),
            Some(&CanonicalValue::Text("NUM".into()))
        );
        assert_eq!(records[1].get("Customs Quantity"), Some(&CanonicalValue::Number(5.0)));
    }

    #[test]
    fn test_absent_sources_leave_derived_absent() {
        let schema = TargetSchema::invoice_default();
        let mut records = vec![record(None, Some(3.0)), record(Some("6201"), None)];

        apply_derived(&mut records, &schema, None);

        assert_eq!(records[0].get("Customs Unit of Measure"), None);
        assert_eq!(records[0].get("Customs Quantity"), None);
        assert!(records[0].values.contains_key("Customs Quantity"));
        assert_eq!(records[1].get("Customs Quantity"), None);
        assert!(records.iter().all(|r| r.problems.is_empty()));
    }

    #[test]
    fn test_advisor_asked_once_per_code() {
        let advisor = MockAdvisor::new().with_unit("8471", "kg");
        let table = UnitTable::default();
        let mut resolver = UnitResolver::new(&table, Some(&advisor));

        assert_eq!(resolver.resolve("8471"), "KG");
        assert_eq!(resolver.resolve(" 8471 "), "KG");
        assert_eq!(resolver.resolve("6110"), "DOZ");
        assert_eq!(resolver.resolve("9403"), "NUM");
        assert_eq!(advisor.unit_calls(), 2);
        assert_eq!(resolver.advisor_lookups(), 2);
    }

    #[test]
    fn test_failing_advisor_falls_back_to_default() {
        let advisor = MockAdvisor::failing();
        let table = UnitTable::default();
        let mut resolver = UnitResolver::new(&table, Some(&advisor));

        assert_eq!(resolver.resolve("9403"), "NUM");
    }
}
