//! Property-based tests for the matcher, coercion and pipeline.
//!
//! These tests use proptest to generate random inputs and verify that the
//! pipeline maintains its invariants under all conditions.
//!
//! # Running Property Tests
//!
//! ```bash
//! # Run all property tests
//! cargo test -p invoice-normalizer --test property_tests
//!
//! # Run with more cases (slower but more thorough)
//! PROPTEST_CASES=10000 cargo test -p invoice-normalizer --test property_tests
//! ```

use std::collections::HashSet;

use proptest::prelude::*;

use invoice_normalizer::matching::{normalize_header, similarity};
use invoice_normalizer::normalize::parse_amount;
use invoice_normalizer::{HeaderMatcher, RawTable, TargetSchema, process};

// =============================================================================
// Test Strategies
// =============================================================================

/// Generate header-like strings, including blanks and punctuation.
fn header_like() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Za-z ]{1,20}",
        "[A-Za-z#$/_\\- ]{0,20}",
        Just(String::new()),
        Just("Qty".to_string()),
        Just("Amount US$".to_string()),
        Just("Style Code".to_string()),
    ]
}

/// Generate cell-like strings: amounts, dates, null tokens, noise.
fn cell_like() -> impl Strategy<Value = String> {
    prop_oneof![
        "[0-9]{1,6}(\\.[0-9]{1,2})?",
        "\\$[0-9]{1,3}(,[0-9]{3})*\\.[0-9]{2}",
        "\\([0-9]{1,4}\\.[0-9]{2}\\)",
        "20[0-9]{2}-[01][0-9]-[0-3][0-9]",
        Just("N/A".to_string()),
        Just(String::new()),
        "\\PC{0,30}",
    ]
}

fn table_strategy() -> impl Strategy<Value = RawTable> {
    (1usize..8).prop_flat_map(|width| {
        (
            prop::collection::vec(header_like(), width),
            prop::collection::vec(prop::collection::vec(cell_like(), 0..=width), 0..20),
        )
            .prop_map(|(headers, rows)| RawTable::from_strings(headers, rows))
    })
}

// =============================================================================
// Similarity
// =============================================================================

proptest! {
    #[test]
    fn similarity_is_bounded_and_symmetric(a in "\\PC{0,30}", b in "\\PC{0,30}") {
        let (na, nb) = (normalize_header(&a), normalize_header(&b));
        let s = similarity(&na, &nb);

        prop_assert!((0.0..=1.0).contains(&s));
        prop_assert_eq!(s, similarity(&nb, &na));
    }

    #[test]
    fn normalize_header_is_idempotent(a in "[A-Za-z0-9 #$/_.\\-]{0,40}") {
        let once = normalize_header(&a);
        prop_assert_eq!(normalize_header(&once), once);
    }
}

// =============================================================================
// Matching
// =============================================================================

proptest! {
    #[test]
    fn mapping_is_one_to_one(headers in prop::collection::vec(header_like(), 0..10)) {
        let schema = TargetSchema::invoice_default();
        let mapping = HeaderMatcher::new().match_headers(&headers, &schema);

        prop_assert_eq!(mapping.assignments.len(), headers.len());

        let mut seen = HashSet::new();
        for assignment in &mapping.assignments {
            if let Some(field) = &assignment.field {
                prop_assert!(seen.insert(field.clone()), "field {} assigned twice", field);
                prop_assert!(assignment.score >= mapping.threshold);
            }
        }
        prop_assert_eq!(
            mapping.ignored_headers.len() + mapping.mapped_count(),
            headers.len()
        );
    }
}

// =============================================================================
// Coercion
// =============================================================================

proptest! {
    #[test]
    fn parse_amount_never_panics(s in "\\PC{0,40}") {
        if let Some(v) = parse_amount(&s) {
            prop_assert!(v.is_finite());
        }
    }

    #[test]
    fn parse_amount_reads_formatted_amounts(whole in 0u32..1_000_000, cents in 0u32..100) {
        let plain = format!("{}.{:02}", whole, cents);
        let expected: f64 = plain.parse().unwrap();

        prop_assert_eq!(parse_amount(&format!("${}", plain)), Some(expected));
        prop_assert_eq!(parse_amount(&format!("({})", plain)), Some(-expected));
    }
}

// =============================================================================
// Pipeline
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn process_never_fails_with_a_real_header(table in table_strategy()) {
        let schema = TargetSchema::invoice_default();
        let has_header = table.headers.iter().any(|h| !h.trim().is_empty());

        match process(&table, &schema) {
            Ok(result) => {
                prop_assert!(has_header);
                prop_assert_eq!(result.records.len(), table.row_count());
                prop_assert!(!result.output.is_empty());
            }
            Err(_) => prop_assert!(!has_header),
        }
    }

    #[test]
    fn process_is_deterministic(table in table_strategy()) {
        let schema = TargetSchema::invoice_default();
        if let (Ok(a), Ok(b)) = (process(&table, &schema), process(&table, &schema)) {
            prop_assert_eq!(a.output, b.output);
            prop_assert_eq!(a.problems, b.problems);
        }
    }
}
