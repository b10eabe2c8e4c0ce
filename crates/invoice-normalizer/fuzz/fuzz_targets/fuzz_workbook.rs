//! Fuzz target for workbook and delimited-text ingestion.
//!
//! Arbitrary bytes must never panic the readers; they either produce a
//! table or an error.

#![no_main]

use invoice_normalizer::{Parser, read_workbook};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Only process reasonable-sized inputs to avoid OOM
    if data.len() > 100_000 {
        return;
    }

    let _ = read_workbook(data, "upload.xlsx");
    let _ = read_workbook(data, "upload.xls");
    let _ = Parser::new().parse_named_bytes(data, "upload.csv");
});
