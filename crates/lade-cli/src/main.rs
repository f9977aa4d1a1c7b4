//! # lade-cli
//!
//! Binary entry point for the Lease Archive Discovery Engine.
//!
//! This is a thin orchestration layer that delegates all business logic to
//! library crates (`lade-core`, `lade-cloud`, `lade-persistence`,
//! `lade-engine`, `lade-jobs`).
//!
//! ## Commands
//!
//! - `lade run-worker` -- starts the job-runner worker pool, draining its
//!   queue until interrupted.
//! - `lade trigger` -- manually fires the write-hook for one lease and waits
//!   for the resulting job to finish, for local/manual exercising of the
//!   pipeline.
//! - `lade config show` -- prints an agency's resolved storage configuration.
//!
//! ## Global Allocator
//!
//! Uses `mimalloc` for improved memory allocation performance.

use clap::Parser;
use mimalloc::MiMalloc;

mod cli;
mod commands;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    match cli.command {
        cli::Commands::RunWorker(args) => commands::run_worker::run(args).await,
        cli::Commands::Trigger(args) => commands::trigger::run(args).await,
        cli::Commands::Config { command } => commands::config::run(command).await,
    }
}
