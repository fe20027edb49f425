//! Coachcraft command-line entry point.
//!
//! Binary name: `ccraft`
//!
//! Parses CLI arguments, sets up tracing, then dispatches to the command
//! handler.

mod cli;

use clap::Parser;

use coachcraft_infra::config::{process_env, resolve_data_dir};
use coachcraft_observe::tracing_setup::{init_tracing, shutdown_tracing};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info,coachcraft=debug",
        _ => "trace",
    };
    if let Err(e) = init_tracing(filter, cli.otel) {
        eprintln!("Warning: failed to initialize tracing: {e}");
    }

    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| resolve_data_dir(process_env));

    let outcome = match cli.command {
        Commands::Reply(args) => cli::reply::run(args, &data_dir, cli.json).await,
        Commands::Prompt(args) => cli::prompt::run(args, cli.json).await,
    };

    shutdown_tracing();
    outcome
}
