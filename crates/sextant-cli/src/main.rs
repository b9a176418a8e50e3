//! Sextant CLI - Command-line interface for the CDCL SAT solver.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sextant")]
#[command(author, version, about = "CDCL SAT solver with baseline and VSIDS branching", long_about = None)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve one DIMACS CNF file
    Solve(commands::solve::SolveArgs),
    /// Run every heuristic over a set of CNF files and write a CSV table
    Batch(commands::batch::BatchArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Solve(args) => commands::solve::run(args),
        Commands::Batch(args) => commands::batch::run(args),
    }
}
