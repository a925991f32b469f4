//! Unified musync CLI.
//!
//! - `musync run` - Run the agent
//! - `musync check` - Validate a configuration and print the schedule

use std::process::ExitCode;

use clap::{Parser, Subcommand};

/// musync unified CLI.
#[derive(Parser)]
#[command(
    name = "musync",
    version,
    about = "Keep a local proxy's users and traffic in sync with a remote panel",
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the agent.
    #[command(name = "run", alias = "agent")]
    Run(Box<musync_agent::RunArgs>),

    /// Validate a configuration file.
    #[command(name = "check")]
    Check(musync_agent::CheckArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => musync_agent::cli::run(*args).await,
        Commands::Check(args) => musync_agent::cli::check(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
