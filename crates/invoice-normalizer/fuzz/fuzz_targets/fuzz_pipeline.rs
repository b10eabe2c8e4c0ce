//! Fuzz target for the full pipeline.
//!
//! Any table with a non-blank header must process successfully and keep one
//! record per input row.

#![no_main]

use invoice_normalizer::{RawTable, TargetSchema, process};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (Vec<String>, Vec<Vec<String>>)| {
    let (headers, rows) = input;
    if headers.len() > 64 || rows.len() > 256 {
        return;
    }

    let table = RawTable::from_strings(headers, rows);
    let has_header = table.headers.iter().any(|h| !h.trim().is_empty());

    match process(&table, &TargetSchema::invoice_default()) {
        Ok(result) => assert_eq!(result.records.len(), table.row_count()),
        Err(_) => assert!(!has_header),
    }
});
