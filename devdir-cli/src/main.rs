//! Devdir — directory issue-tracker reconciliation CLI.
//!
//! # Usage
//!
//! ```text
//! devdir run [--config <path>] [--dry-run]
//! devdir stats [--config <path>] [--json]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{run::RunArgs, stats::StatsArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "devdir",
    version,
    about = "Mirror qualifying partner issues into a central directory repository",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one full reconciliation pass against the configured directory.
    Run(RunArgs),

    /// Show reward statistics from the last persisted snapshot.
    Stats(StatsArgs),
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => args.run(),
        Commands::Stats(args) => args.run(),
    }
}
