//! CLI command definitions for the `ccraft` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod conversation;
pub mod prompt;
pub mod reply;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Generate coaching replies from the command line.
#[derive(Parser)]
#[command(name = "ccraft", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    /// Data directory holding config.toml (default: ~/.coachcraft).
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a coaching reply for the latest user message.
    Reply(reply::ReplyArgs),

    /// Print the composed message sequence without calling a model.
    Prompt(prompt::PromptArgs),
}
