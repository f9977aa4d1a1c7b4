//! # Run-Worker Command Handler
//!
//! Handles the `lade run-worker` subcommand, which starts the job-runner
//! worker pool against a local data directory and runs until interrupted.
//!
//! ## Flow
//!
//! 1. Build the selected `CloudPort` (Dropbox or the in-memory fake).
//! 2. Open the TOML `ConfigStore` and JSON-file lease/cloud-location
//!    repositories rooted at `--data-dir`.
//! 3. Spawn `--workers` worker tasks against an in-memory dedup store.
//! 4. Block until `Ctrl-C`, then let in-flight jobs finish naturally.

// Layer 1: Standard library
use std::sync::Arc;

// Layer 2: External crates
use anyhow::Context;
use tracing::info;

// Layer 3: Internal crates/modules
use lade_jobs::JobRunner;
use lade_persistence::config::TomlConfigStore;
use lade_persistence::dedup::InMemoryDedupStore;
use lade_persistence::repository::{JsonFileCloudLocationRepository, JsonFileLeaseRepository};

use crate::cli::RunWorkerArgs;

/// Runs the worker-pool command.
///
/// # Errors
///
/// Returns an error if the cloud port cannot be constructed or if waiting
/// on the shutdown signal fails.
pub async fn run(args: RunWorkerArgs) -> anyhow::Result<()> {
    let cloud = super::build_cloud_port(args.fake_cloud, args.dropbox_token.as_deref())?;
    let config = Arc::new(TomlConfigStore::new(args.data_dir.join("config")));
    let leases = Arc::new(JsonFileLeaseRepository::new(&args.data_dir));
    let locations = Arc::new(JsonFileCloudLocationRepository::new(&args.data_dir));
    let dedup = Arc::new(InMemoryDedupStore::new());

    let runner = Arc::new(JobRunner::new(Arc::new(cloud), config, leases, locations, dedup));
    let _handles = runner.spawn_workers(args.workers);

    info!(workers = args.workers, data_dir = %args.data_dir.display(), "worker pool started");
    tokio::signal::ctrl_c().await.context("failed to listen for shutdown signal")?;
    info!("shutdown signal received, exiting");
    Ok(())
}
