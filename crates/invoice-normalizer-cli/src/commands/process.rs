//! Process command - normalize an invoice and write the standardized file.

use std::path::{Path, PathBuf};

use chrono::Local;
use colored::Colorize;
use invoice_normalizer::{
    Pipeline, PipelineConfig, ProblemKind, ProcessingResult, SourceMetadata, output_file_name,
};
use serde_json::json;

use super::{CommandResult, build_advisor, load_schema, matcher_config, read_table};
use crate::cli::ProcessArgs;

/// Problems listed before the output is cut short.
const MAX_LISTED_PROBLEMS: usize = 20;

pub fn run(args: ProcessArgs, verbose: bool) -> CommandResult {
    if !args.file.exists() {
        return Err(format!("File not found: {}", args.file.display()).into());
    }

    println!(
        "{} {}",
        "Processing".cyan().bold(),
        args.file.display().to_string().white()
    );

    let schema = load_schema(args.schema.as_deref())?;
    let config = PipelineConfig {
        matcher: matcher_config(args.threshold)?,
        output_format: args.format,
        parallel_rows: args.parallel,
    };
    let mut pipeline = Pipeline::with_config(schema.into(), config)?;
    if let Some(advisor) = build_advisor(args.llm, args.model)? {
        pipeline = pipeline.with_shared_advisor(advisor);
    }

    let (table, source) = read_table(&args.file)?;
    let result = pipeline.process(&table)?;

    let output_path = args
        .output
        .unwrap_or_else(|| default_output_path(&args.file, &result));
    std::fs::write(&output_path, &result.output)?;

    print_summary(&result, verbose);

    println!();
    println!(
        "{} {}",
        "Saved to".green().bold(),
        output_path.display().to_string().white()
    );

    if let Some(report_path) = args.report {
        let report = report_json(&source, &output_path, &result);
        std::fs::write(&report_path, serde_json::to_string_pretty(&report)?)?;
        println!(
            "{} {}",
            "Report written to".green().bold(),
            report_path.display().to_string().white()
        );
    }

    Ok(())
}

fn default_output_path(input: &Path, result: &ProcessingResult) -> PathBuf {
    let original = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = output_file_name(&original, Local::now().naive_local(), result.format);
    input.with_file_name(name)
}

fn report_json(
    source: &SourceMetadata,
    output: &Path,
    result: &ProcessingResult,
) -> serde_json::Value {
    json!({
        "source": source,
        "output": output.display().to_string(),
        "summary": result.summary,
        "mapping": result.mapping,
        "problems": result.problems,
        "warnings": result.warnings,
    })
}

fn print_summary(result: &ProcessingResult, verbose: bool) {
    let summary = &result.summary;

    if verbose {
        println!();
        println!("{}", "Mapping:".yellow().bold());
        for assignment in &result.mapping.assignments {
            match &assignment.field {
                Some(field) => println!(
                    "  {:30} -> {:25} {:.2}",
                    assignment.header, field, assignment.score
                ),
                None => println!("  {:30} -> {}", assignment.header, "(ignored)".dimmed()),
            }
        }
    }

    println!();
    println!(
        "Read {} rows; {} mapped, {} unmapped fields, {} ignored headers",
        summary.rows_total.to_string().white().bold(),
        summary.fields_mapped.to_string().green(),
        summary.fields_unmapped.to_string().yellow(),
        summary.headers_ignored
    );

    for field in &result.mapping.missing_fields {
        println!("  {} required field '{}' has no column", "Missing:".red().bold(), field);
    }
    for warning in &result.warnings {
        println!("  {} {}", "Warning:".yellow().bold(), warning.message());
    }

    if result.problems.is_empty() {
        println!("{}", "No problems found - every row is valid!".green());
        return;
    }

    println!(
        "Found {} problems in {} rows ({} missing, {} type mismatches)",
        result.problems.len().to_string().white().bold(),
        summary.rows_with_errors.to_string().red(),
        summary.problems.missing_required_field.to_string().red(),
        summary.problems.type_mismatch.to_string().yellow()
    );

    for problem in result.problems.iter().take(MAX_LISTED_PROBLEMS) {
        let tag = match problem.kind {
            ProblemKind::MissingRequiredField => "missing".red(),
            ProblemKind::TypeMismatch { .. } => "invalid".yellow(),
        };
        println!(
            "  line {:>5} [{}] {}: {}",
            problem.line, tag, problem.field, problem.message
        );
    }
    if result.problems.len() > MAX_LISTED_PROBLEMS {
        println!(
            "  ... and {} more",
            result.problems.len() - MAX_LISTED_PROBLEMS
        );
    }
}
