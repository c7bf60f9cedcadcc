//! # bloom-cli
//!
//! Command-line front end for Bloom goal tracking:
//! - `bloom goal create/progress/delete` — change goals
//! - `bloom goal list/show` — inspect goals, milestones and deadlines

mod commands;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::BloomConfig;

/// Bloom — track goals and milestones.
#[derive(Parser)]
#[command(name = "bloom", version, about)]
struct Cli {
    /// Data directory (defaults to .bloom in the current directory).
    #[arg(long, default_value = ".bloom")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage goals.
    Goal {
        #[command(subcommand)]
        command: commands::goal::GoalCommands,
    },
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so command output on stdout stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("bloom_goal=info".parse()?)
                .add_directive("bloom=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    let config = BloomConfig::load(&cli.data_dir)?;

    match &cli.command {
        Commands::Goal { command } => commands::goal::execute(command, &config),
    }
}
