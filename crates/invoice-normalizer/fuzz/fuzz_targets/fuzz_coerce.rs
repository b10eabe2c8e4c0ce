//! Fuzz target for cell coercion.
//!
//! Every field type must accept any text without panicking, and numeric
//! results must be finite.

#![no_main]

use invoice_normalizer::normalize::{CanonicalValue, Coerced, coerce};
use invoice_normalizer::{CellValue, FieldType, TargetSchema};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (String, f64)| {
    let (text, number) = input;
    let formats = TargetSchema::invoice_default().date_formats;

    for field_type in [
        FieldType::String,
        FieldType::Number,
        FieldType::Currency,
        FieldType::Date,
    ] {
        for cell in [CellValue::Text(text.clone()), CellValue::Number(number)] {
            if let Coerced::Value(CanonicalValue::Number(n) | CanonicalValue::Currency(n)) =
                coerce(&cell, field_type, &formats)
            {
                assert!(n.is_finite());
            }
        }
    }
});
