//! apisync: deploy the API projects touched by a change.
//!
//! # Usage
//!
//! ```text
//! apisync init [--force] [--repo <dir>]
//! apisync status -e <env> [--changed-from <file|->] [--json]
//! apisync deploy -e <env> [--dry-run] [--jobs N] [--changed-from <file|->] [--json]
//! apisync show <project-dir> -e <env> [--json]
//! ```

mod commands;
mod vcs;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{deploy::DeployArgs, init::InitArgs, show::ShowArgs, status::StatusArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "apisync",
    version,
    about = "Deploy the API, API product and application projects affected by a change",
    long_about = None,
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Give the current repository an id for deployment bookkeeping.
    Init(InitArgs),

    /// List the projects the next deploy would touch.
    Status(StatusArgs),

    /// Deploy every changed project to an environment.
    Deploy(DeployArgs),

    /// Print the environment override resolved for one project.
    Show(ShowArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Init(args) => args.run(),
        Commands::Status(args) => args.run(),
        Commands::Deploy(args) => args.run(),
        Commands::Show(args) => args.run(),
    }
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
