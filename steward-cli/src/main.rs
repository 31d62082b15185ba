//! Steward: declarative repository settings and CI registry checks.
//!
//! # Usage
//!
//! ```text
//! steward manage [--config-file ~/.github-projects.config] [-p github/projects.yaml] [--dry-run] [--debug]
//! steward check [--registry zuul.d/projects.yaml] [--projects github/projects.yaml]
//!               [--policy FILE] [--token-file FILE] [--skip-remote] [--debug]
//! ```

mod commands;
mod credentials;
mod logging;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;

use commands::{check::CheckArgs, manage::ManageArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "steward",
    version,
    about = "Reconcile hosted repository settings and check the CI project registry",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Bring hosted repositories and branch protections in line with the project list.
    Manage(ManageArgs),

    /// Check the CI project registry for consistency.
    Check(CheckArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Manage(args) => args.run(),
        Commands::Check(args) => args.run(),
    };
    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
