//! Example: Normalize a client invoice workbook.
//!
//! Usage:
//!   cargo run --example normalize -- <invoice.xlsx> [output.xlsx]
//!
//! Example:
//!   cargo run --example normalize -- client_invoice.xlsx processed.xlsx

use std::env;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use invoice_normalizer::{MockAdvisor, NormalizerError, Pipeline, TargetSchema, read_workbook};

fn main() -> invoice_normalizer::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: cargo run --example normalize -- <invoice.xlsx> [output.xlsx]");
        std::process::exit(1);
    }

    let file_path = &args[1];
    let path = Path::new(file_path);
    let bytes = fs::read(path).map_err(|e| NormalizerError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (table, source) = read_workbook(&bytes, &name)?;

    // Mock advisor (for running without an API key)
    let pipeline = Pipeline::new(Arc::new(TargetSchema::invoice_default()))?
        .with_advisor(MockAdvisor::new());
    let result = pipeline.process(&table)?;

    let separator = "=".repeat(80);
    println!("{}", separator);
    println!("Invoice Normalization: {}", source.file);
    println!("{}", separator);
    println!();

    println!("## Header Mapping");
    for assignment in &result.mapping.assignments {
        match &assignment.field {
            Some(field) => println!(
                "  {:30} -> {:25} ({:.2})",
                assignment.header, field, assignment.score
            ),
            None => println!("  {:30} -> (ignored)", assignment.header),
        }
    }
    for field in &result.mapping.missing_fields {
        println!("  {:30} -> {} (missing)", "", field);
    }
    println!();

    println!("## Problems ({} total)", result.problems.len());
    for problem in result.problems.iter().take(20) {
        println!("  line {:>5} [{}] {}", problem.line, problem.field, problem.message);
    }
    if result.problems.len() > 20 {
        println!("  ... and {} more", result.problems.len() - 20);
    }
    println!();

    if let Some(out) = args.get(2) {
        fs::write(out, &result.output).map_err(|e| NormalizerError::Io {
            path: out.into(),
            source: e,
        })?;
        println!("Wrote {} rows to {}", result.summary.rows_total, out);
    }

    Ok(())
}
