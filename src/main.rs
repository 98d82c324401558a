//! mise-action - install mise in CI
//!
//! CLI entry point that dispatches to the main and post steps.

use clap::Parser;
use console::style;
use mise_action::cli::{Cli, Commands};
use mise_action::error::ActionResult;
use mise_action::runner::issue_error;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            issue_error(&e.to_string());
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> ActionResult<()> {
    let cli = Cli::parse();

    // 0 = info (RUNNER_DEBUG=1 raises to debug), 1 = debug, 2+ = trace
    let runner_debug = std::env::var("RUNNER_DEBUG").is_ok_and(|v| v == "1");
    let filter = match (cli.verbose, runner_debug) {
        (0, false) => EnvFilter::new("mise_action=info"),
        (0, true) | (1, _) => EnvFilter::new("mise_action=debug"),
        _ => EnvFilter::new("mise_action=trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        Commands::Run(args) => mise_action::cli::commands::run(args, cli.cache_dir.as_deref()).await,
        Commands::Post => mise_action::cli::commands::post(cli.cache_dir.as_deref()).await,
    }
}
