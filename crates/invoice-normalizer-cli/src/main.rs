//! invnorm - normalize client invoice spreadsheets.

mod cli;
mod commands;
mod server;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Process(args) => commands::process::run(args, cli.verbose),

        Commands::Match {
            file,
            schema,
            threshold,
        } => commands::match_cmd::run(file, schema, threshold, cli.verbose),

        Commands::Schema { output } => commands::schema::run(output),

        Commands::Serve {
            port,
            output_dir,
            schema,
            llm,
        } => commands::serve::run(port, output_dir, schema, llm),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Logs go to stderr so command output stays pipeable. `RUST_LOG` wins over
/// `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose {
        "info,invoice_normalizer=debug"
    } else {
        "warn"
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
