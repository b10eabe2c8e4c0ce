//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use invoice_normalizer::OutputFormat;

/// invnorm: map client invoice spreadsheets onto the standard export layout
#[derive(Parser)]
#[command(name = "invnorm")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Normalize an invoice and write the standardized file
    Process(ProcessArgs),

    /// Show how the headers of a file map onto the schema
    Match {
        /// Path to the invoice (xls/xlsx, or csv/tsv)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Target schema JSON (default: built-in invoice schema)
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Acceptance threshold for header matches (0.0 - 1.0)
        #[arg(short, long)]
        threshold: Option<f64>,
    },

    /// Print or write the built-in invoice schema as JSON
    Schema {
        /// Write the schema to this path instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the HTTP upload service
    Serve {
        /// Port for web server
        #[arg(short, long, default_value = "3141")]
        port: u16,

        /// Directory where processed files are stored
        #[arg(long, default_value = "processed")]
        output_dir: PathBuf,

        /// Target schema JSON (default: built-in invoice schema)
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// LLM provider used as mapping advisor
        #[arg(long, default_value = "none")]
        llm: LlmProviderChoice,
    },
}

#[derive(Args)]
pub struct ProcessArgs {
    /// Path to the invoice (xls/xlsx, or csv/tsv)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Output path (default: processed_<timestamp>_<stem>.<ext> next to FILE)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Target schema JSON (default: built-in invoice schema)
    #[arg(short, long)]
    pub schema: Option<PathBuf>,

    /// Output format (xlsx or csv)
    #[arg(short, long, default_value = "xlsx", value_parser = parse_output_format)]
    pub format: OutputFormat,

    /// Acceptance threshold for header matches (0.0 - 1.0)
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// LLM provider used as mapping advisor
    #[arg(long, default_value = "none")]
    pub llm: LlmProviderChoice,

    /// Model to use (provider-specific, e.g., "gpt-4o")
    #[arg(long)]
    pub model: Option<String>,

    /// Normalize rows in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Write the processing report as JSON to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}

fn parse_output_format(s: &str) -> Result<OutputFormat, String> {
    s.parse().map_err(|e: invoice_normalizer::NormalizerError| e.to_string())
}

/// LLM provider choice for the mapping advisor
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LlmProviderChoice {
    /// No LLM - fuzzy matching only
    #[default]
    None,
    /// OpenAI chat completions (requires OPENAI_API_KEY)
    OpenAI,
    /// Mock provider for testing
    Mock,
}

impl std::str::FromStr for LlmProviderChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(LlmProviderChoice::None),
            "openai" | "gpt" => Ok(LlmProviderChoice::OpenAI),
            "mock" | "test" => Ok(LlmProviderChoice::Mock),
            _ => Err(format!(
                "Unknown provider: {}. Use: none, openai, or mock.",
                s
            )),
        }
    }
}

impl std::fmt::Display for LlmProviderChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProviderChoice::None => write!(f, "none"),
            LlmProviderChoice::OpenAI => write!(f, "openai"),
            LlmProviderChoice::Mock => write!(f, "mock"),
        }
    }
}
