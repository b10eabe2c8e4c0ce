//! Match command - show the header mapping for a file without processing it.

use std::path::PathBuf;

use colored::Colorize;
use invoice_normalizer::{HeaderMatcher, matching::MatchSource};

use super::{CommandResult, load_schema, matcher_config, read_table};

pub fn run(
    file: PathBuf,
    schema: Option<PathBuf>,
    threshold: Option<f64>,
    verbose: bool,
) -> CommandResult {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    let schema = load_schema(schema.as_deref())?;
    let matcher = HeaderMatcher::with_config(matcher_config(threshold)?);
    let (table, source) = read_table(&file)?;
    let mapping = matcher.match_headers(&table.headers, &schema);

    println!(
        "{} {} ({} columns, threshold {:.2})",
        "Headers of".cyan().bold(),
        source.file.white(),
        source.column_count,
        mapping.threshold
    );
    println!();

    for assignment in &mapping.assignments {
        let Some(field) = &assignment.field else {
            println!(
                "  {:>3}  {:30} {}",
                assignment.index,
                assignment.header,
                "ignored".dimmed()
            );
            continue;
        };

        let score = format!("{:.2}", assignment.score);
        let score = if assignment.score >= 0.9 {
            score.green()
        } else {
            score.yellow()
        };
        print!(
            "  {:>3}  {:30} -> {:25} {}",
            assignment.index, assignment.header, field, score
        );
        if verbose {
            if let Some(alias) = &assignment.matched_alias {
                print!("  via '{}'", alias);
            }
            if assignment.source == Some(MatchSource::Advisor) {
                print!("  (advisor)");
            }
        }
        println!();
    }

    println!();
    if mapping.is_complete() {
        println!("{}", "All required fields are mapped.".green());
    } else {
        for field in &mapping.missing_fields {
            println!("{} {}", "Missing required field:".red().bold(), field);
        }
    }
    for warning in &mapping.warnings {
        println!("{} {}", "Warning:".yellow().bold(), warning.message());
    }

    Ok(())
}
