//! Schema command - print or export the built-in invoice schema.

use std::path::PathBuf;

use colored::Colorize;
use invoice_normalizer::TargetSchema;

use super::CommandResult;

pub fn run(output: Option<PathBuf>) -> CommandResult {
    let json = TargetSchema::invoice_default().to_json_pretty()?;

    match output {
        Some(path) => {
            std::fs::write(&path, json)?;
            println!(
                "{} {}",
                "Schema written to".green().bold(),
                path.display().to_string().white()
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}
