//! Simulation driver for the stacker engine.
//!
//! Runs the engine against the in-memory sandbox world on a real
//! [`StackerRuntime`](stacker_runtime::StackerRuntime): a designated thread,
//! a worker pool and the in-memory registry.
//!
//! ```bash
//! cargo run -p stacker-sim -- run --kind zombie --population 500
//! cargo run -p stacker-sim -- catalog
//! ```

mod commands;
mod logging;

use anyhow::Result;
use clap::Parser;
use commands::{Catalog, Run};

/// Creature stacking simulation
#[derive(Parser)]
#[command(name = "stacker-sim")]
#[command(about = "Drive the stack engine against an in-memory world", long_about = None)]
#[command(version)]
struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Spawn a population, stack it, and kill it off
    Run(Run),

    /// Print the per-type stack settings in effect
    Catalog(Catalog),
}

fn main() -> Result<()> {
    // STACKER_* variables may come from a .env file
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    logging::setup_logging(&cli.log)?;

    match cli.command {
        Command::Run(cmd) => cmd.execute(),
        Command::Catalog(cmd) => cmd.execute(),
    }
}
