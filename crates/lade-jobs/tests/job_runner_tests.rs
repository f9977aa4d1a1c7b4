//! End-to-end job-runner scenarios exercised against fakes: dedup collapse,
//! retry-then-success, terminal failure on a non-retryable error, and
//! timeout handling under a tight retry policy.

use std::sync::Arc;
use std::time::Duration;

use lade_cloud::fake::FakeCloudPort;
use lade_core::model::{AgencyStorageConfig, Lease, LeaseId};
use lade_jobs::{JobOutcome, JobRunner, RetryPolicy};
use lade_persistence::config::TomlConfigStore;
use lade_persistence::dedup::InMemoryDedupStore;
use lade_persistence::repository::{JsonFileCloudLocationRepository, JsonFileLeaseRepository};

async fn seed_agency(config: &TomlConfigStore, base_path: &str, auto_create: bool) {
    config
        .save(&AgencyStorageConfig {
            agency: "NMSLO".into(),
            runsheet_archive_base_path: base_path.into(),
            subfolders: vec!["Documents".into()],
            auto_create_runsheet_archives: auto_create,
            enabled: true,
            report_detection_pattern: AgencyStorageConfig::DEFAULT_REPORT_PATTERN.into(),
        })
        .await
        .unwrap();
}

fn fast_retry_policy() -> RetryPolicy {
    RetryPolicy { initial_backoff: Duration::from_millis(1), multiplier: 1.0, max_backoff: Duration::from_millis(5), max_attempts: 5 }
}

#[tokio::test]
async fn successful_discovery_releases_dedup_and_reports_done() {
    let dir = tempfile::tempdir().unwrap();
    let cloud = Arc::new(FakeCloudPort::new());
    cloud.seed_folder("/State Workspace/Archive/12345");
    cloud.seed_file("/State Workspace/Archive/12345/Master Documents 2019.pdf");
    let config = Arc::new(TomlConfigStore::new(dir.path().join("config")));
    seed_agency(&config, "/State Workspace/Archive", true).await;
    let leases = Arc::new(JsonFileLeaseRepository::new(dir.path().join("leases")));
    let id = LeaseId::new("NMSLO", "12345");
    leases.seed(Lease::new(id.clone())).await.unwrap();
    let locations = Arc::new(JsonFileCloudLocationRepository::new(dir.path().join("locations")));
    let dedup = Arc::new(InMemoryDedupStore::new());

    let runner = JobRunner::new(cloud, config, leases.clone(), locations, dedup)
        .with_timing(fast_retry_policy(), Duration::from_secs(30), Duration::from_secs(60));
    let enqueued = runner.trigger("full_discovery", &id, Some("user-1"), &["status".to_string()]).await;
    assert!(enqueued);

    let job = runner.receiver().recv().await.unwrap();
    let outcome = runner.process(job).await;
    assert_eq!(outcome, JobOutcome::Done);

    let lease = leases.get(&id).await.unwrap();
    assert!(lease.runsheet_report_found);
}

#[tokio::test]
async fn transient_failures_retry_then_succeed() {
    let dir = tempfile::tempdir().unwrap();
    let cloud = Arc::new(FakeCloudPort::new());
    cloud.seed_folder("/State Workspace/Archive");
    cloud.fail_next_n_times("/State Workspace/Archive/12345", 2);
    let config = Arc::new(TomlConfigStore::new(dir.path().join("config")));
    seed_agency(&config, "/State Workspace/Archive", true).await;
    let leases = Arc::new(JsonFileLeaseRepository::new(dir.path().join("leases")));
    let id = LeaseId::new("NMSLO", "12345");
    leases.seed(Lease::new(id.clone())).await.unwrap();
    let locations = Arc::new(JsonFileCloudLocationRepository::new(dir.path().join("locations")));
    let dedup = Arc::new(InMemoryDedupStore::new());

    let runner = JobRunner::new(cloud, config, leases.clone(), locations, dedup)
        .with_timing(fast_retry_policy(), Duration::from_secs(30), Duration::from_secs(60));
    runner.trigger("full_discovery", &id, Some("user-1"), &["status".to_string()]).await;

    let mut job = runner.receiver().recv().await.unwrap();
    let mut outcome = runner.process(job).await;
    assert!(matches!(outcome, JobOutcome::Requeued { attempt: 2 }));

    job = runner.receiver().recv().await.unwrap();
    outcome = runner.process(job).await;
    assert!(matches!(outcome, JobOutcome::Requeued { attempt: 3 }));

    job = runner.receiver().recv().await.unwrap();
    outcome = runner.process(job).await;
    assert_eq!(outcome, JobOutcome::Done);
}

#[tokio::test]
async fn base_path_missing_is_terminal_without_retry() {
    let dir = tempfile::tempdir().unwrap();
    let cloud = Arc::new(FakeCloudPort::new());
    let config = Arc::new(TomlConfigStore::new(dir.path().join("config")));
    seed_agency(&config, "/State Workspace/Archive", true).await;
    let leases = Arc::new(JsonFileLeaseRepository::new(dir.path().join("leases")));
    let id = LeaseId::new("NMSLO", "12345");
    leases.seed(Lease::new(id.clone())).await.unwrap();
    let locations = Arc::new(JsonFileCloudLocationRepository::new(dir.path().join("locations")));
    let dedup = Arc::new(InMemoryDedupStore::new());

    let runner = JobRunner::new(cloud, config, leases, locations, dedup)
        .with_timing(fast_retry_policy(), Duration::from_secs(30), Duration::from_secs(60));
    runner.trigger("full_discovery", &id, Some("user-1"), &["status".to_string()]).await;

    let job = runner.receiver().recv().await.unwrap();
    let outcome = runner.process(job).await;
    assert!(matches!(outcome, JobOutcome::FailedTerminal(_)));
}

#[tokio::test]
async fn hard_timeout_with_no_attempts_remaining_fails_terminally() {
    let dir = tempfile::tempdir().unwrap();
    let cloud = Arc::new(FakeCloudPort::new());
    cloud.seed_folder("/State Workspace/Archive");
    // The base path never responds within the hard timeout, forcing every
    // attempt to be cancelled by the hard-timeout race rather than by a
    // returned error.
    cloud.hang_on("/State Workspace/Archive/12345", Duration::from_millis(50));
    let config = Arc::new(TomlConfigStore::new(dir.path().join("config")));
    seed_agency(&config, "/State Workspace/Archive", true).await;
    let leases = Arc::new(JsonFileLeaseRepository::new(dir.path().join("leases")));
    let id = LeaseId::new("NMSLO", "12345");
    leases.seed(Lease::new(id.clone())).await.unwrap();
    let locations = Arc::new(JsonFileCloudLocationRepository::new(dir.path().join("locations")));
    let dedup = Arc::new(InMemoryDedupStore::new());

    let policy = RetryPolicy { initial_backoff: Duration::from_millis(1), multiplier: 1.0, max_backoff: Duration::from_millis(2), max_attempts: 1 };
    let runner = JobRunner::new(cloud, config, leases, locations, dedup)
        .with_timing(policy, Duration::from_millis(5), Duration::from_millis(10));
    runner.trigger("full_discovery", &id, Some("user-1"), &["status".to_string()]).await;

    let job = runner.receiver().recv().await.unwrap();
    let outcome = runner.process(job).await;
    // A hard timeout with no attempts remaining collapses to FailedTerminal,
    // the same terminal kind a non-retryable workflow error produces —
    // there is no separate "timed out" terminal state.
    assert!(matches!(outcome, JobOutcome::FailedTerminal(_)));
}
