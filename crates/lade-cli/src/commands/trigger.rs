//! # Trigger Command Handler
//!
//! Handles the `lade trigger` subcommand, a manual stand-in for the
//! OLTP write hook: fires `JobRunner::trigger` for one lease and drives the
//! resulting job to completion synchronously, for local/manual exercising of
//! the pipeline without a running upstream system.
//!
//! ## Flow
//!
//! 1. Build the `CloudPort`, repositories, and an in-memory dedup store.
//! 2. Seed the lease record if it does not already exist on disk.
//! 3. Call `JobRunner::trigger` with the supplied user id (or `None`, which
//!    reproduces the write hook's quiet-skip-on-no-user behavior).
//! 4. If a job was enqueued, pull it off the queue and run it to completion,
//!    printing the outcome.

// Layer 1: Standard library
use std::sync::Arc;

// Layer 2: External crates
use anyhow::Context;

// Layer 3: Internal crates/modules
use lade_core::model::{Lease, LeaseId};
use lade_core::traits::LeaseRepository;
use lade_jobs::{JobOutcome, JobRunner};
use lade_persistence::config::TomlConfigStore;
use lade_persistence::dedup::InMemoryDedupStore;
use lade_persistence::repository::{JsonFileCloudLocationRepository, JsonFileLeaseRepository};

use crate::cli::TriggerArgs;

/// Runs the manual-trigger command.
///
/// # Errors
///
/// Returns an error if the cloud port cannot be constructed or if seeding
/// the lease record fails.
pub async fn run(args: TriggerArgs) -> anyhow::Result<()> {
    let cloud = super::build_cloud_port(args.fake_cloud, None)?;
    let config = Arc::new(TomlConfigStore::new(args.data_dir.join("config")));
    let leases = Arc::new(JsonFileLeaseRepository::new(&args.data_dir));
    let locations = Arc::new(JsonFileCloudLocationRepository::new(&args.data_dir));
    let dedup = Arc::new(InMemoryDedupStore::new());

    let id = LeaseId::new(args.agency, args.lease);
    if leases.get(&id).await.is_err() {
        leases.seed(Lease::new(id.clone())).await.context("failed to seed lease record")?;
    }

    let runner = JobRunner::new(Arc::new(cloud), config, leases, locations, dedup);
    let enqueued =
        runner.trigger("full_discovery", &id, args.user.as_deref(), &["status".to_string()]).await;

    if !enqueued {
        println!("not enqueued (no user context, duplicate within the dedup window, or a task-managed-only change)");
        return Ok(());
    }

    let job = runner
        .receiver()
        .recv()
        .await
        .context("job queue closed unexpectedly before the triggered job could be pulled")?;
    let outcome = runner.process(job).await;

    match outcome {
        JobOutcome::Done => println!("done: archive discovery completed for {id}"),
        JobOutcome::Requeued { attempt } => {
            println!("requeued for attempt {attempt} (run `lade trigger` again once the backoff elapses)");
        }
        JobOutcome::FailedTerminal(reason) => println!("failed terminally: {reason}"),
    }
    Ok(())
}
