//! Serve command - run the HTTP upload service.

use std::path::PathBuf;

use colored::Colorize;
use invoice_normalizer::Pipeline;

use super::{CommandResult, build_advisor, load_schema};
use crate::cli::LlmProviderChoice;
use crate::server::{app, state::AppState};

pub fn run(
    port: u16,
    output_dir: PathBuf,
    schema: Option<PathBuf>,
    llm: LlmProviderChoice,
) -> CommandResult {
    let schema = load_schema(schema.as_deref())?;
    std::fs::create_dir_all(&output_dir)?;

    // The advisor's blocking HTTP client must be built outside the runtime.
    let mut pipeline = Pipeline::new(schema.into())?;
    if let Some(advisor) = build_advisor(llm, None)? {
        pipeline = pipeline.with_shared_advisor(advisor);
    }
    let state = AppState::new(pipeline, output_dir.clone());

    let url = format!("http://localhost:{}", port);
    println!(
        "{} {}",
        "Starting invoice service at".cyan().bold(),
        url.white().bold()
    );
    println!();
    println!("  Upload:  POST {}/api/process?filename=<name>.xlsx", url);
    println!("  Outputs: {}", output_dir.display());
    println!("  Advisor: {}", llm);
    println!();
    println!("Press {} to stop the server", "Ctrl+C".yellow().bold());

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(app::run_server(state, port))?;

    println!("{}", "Shut down.".yellow());
    Ok(())
}
