//! `DiscoveryWorkflow` and `FullDiscoveryWorkflow`: the two entry points
//! `lade-jobs` drives to completion for a single lease.

// Layer 2: Third-party crate imports
use regex::Regex;
use tracing::{info, instrument};

// Layer 3: Internal module imports
use lade_core::error::WorkflowError;
use lade_core::model::{CloudLocationKey, LeaseId};
use lade_core::traits::{CloudLocationRepository, CloudPort, ConfigStore, LeaseRepository};

use crate::creator::create_archive;
use crate::detector::detect_report;
use crate::finder::find_archive;

/// Outcome of running `DiscoveryWorkflow` to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryOutcome {
    pub found: bool,
    /// `true` when the archive had to be materialized rather than merely
    /// located; distinguishes the two ways `found = true` can happen.
    pub created: bool,
    pub path: Option<String>,
    pub share_url: Option<String>,
    pub cloud_location: Option<CloudLocationKey>,
}

impl DiscoveryOutcome {
    fn not_found() -> Self {
        Self { found: false, created: false, path: None, share_url: None, cloud_location: None }
    }
}

/// Runs the discovery workflow for `lease_id`: loads the lease and agency
/// config, searches for an existing archive, and materializes one when
/// nothing is found and the agency allows it.
///
/// `strict` governs how a missing base path is handled. The full runsheet
/// task passes `strict = true` and lets [`WorkflowError::BasePathMissing`]
/// propagate so the job runner records a terminal failure. A best-effort
/// caller passes `strict = false` to get `DiscoveryOutcome { found: false,
/// .. }` instead.
///
/// # Errors
///
/// Returns [`WorkflowError::Config`] if the agency has no configuration, or
/// if it is disabled (fail-fast, never attempts discovery for a disabled
/// agency). Returns [`WorkflowError::Persistence`] if any repository read or
/// write fails. Returns [`WorkflowError::BasePathMissing`] when `strict` is
/// `true` and the configured base path does not exist.
#[instrument(skip(cloud, leases, locations, config), fields(lease_id = %lease_id))]
pub async fn run_discovery<C, G, L, Locs>(
    lease_id: &LeaseId,
    strict: bool,
    cloud: &C,
    config: &G,
    leases: &L,
    locations: &Locs,
) -> Result<DiscoveryOutcome, WorkflowError>
where
    C: CloudPort,
    G: ConfigStore,
    L: LeaseRepository,
    Locs: CloudLocationRepository,
{
    let lease = leases.get(lease_id).await?;
    let mut cfg = config.load(&lease_id.agency).await?;
    if !cfg.enabled {
        return Err(WorkflowError::Config(lade_core::error::ConfigError::Disabled {
            agency: lease_id.agency.clone(),
        }));
    }
    cfg.normalize();

    let search = find_archive(&lease, cloud, locations, &cfg).await?;
    if search.found {
        leases
            .set_archive_and_link(lease_id, search.cloud_location.clone().unwrap(), search.share_url.clone())
            .await?;
        info!(path = %search.path, "archive already present");
        return Ok(DiscoveryOutcome {
            found: true,
            created: false,
            path: Some(search.path),
            share_url: search.share_url,
            cloud_location: search.cloud_location,
        });
    }

    if !cfg.auto_create_runsheet_archives {
        info!("archive not found and auto-create disabled");
        return Ok(DiscoveryOutcome::not_found());
    }

    let creation = match create_archive(&lease, cloud, locations, &cfg).await {
        Ok(result) => result,
        Err(WorkflowError::BasePathMissing(path)) if !strict => {
            info!(%path, "base path missing, returning not-found for best-effort caller");
            return Ok(DiscoveryOutcome::not_found());
        }
        Err(err) => return Err(err),
    };

    if !creation.success {
        return Ok(DiscoveryOutcome::not_found());
    }

    leases
        .set_archive_and_link(lease_id, creation.cloud_location.clone().unwrap(), creation.share_url.clone())
        .await?;
    info!(path = %creation.path, "archive created");
    Ok(DiscoveryOutcome {
        found: true,
        created: true,
        path: Some(creation.path),
        share_url: creation.share_url,
        cloud_location: creation.cloud_location,
    })
}

/// Outcome of running `FullDiscoveryWorkflow`: the discovery outcome plus
/// whether report detection ran and what it found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullDiscoveryOutcome {
    pub discovery: DiscoveryOutcome,
    /// `None` when discovery did not find/create an archive and detection
    /// was skipped entirely (§4.6: the field is left unchanged, not set to
    /// `false`).
    pub report_found: Option<bool>,
}

/// Runs discovery, then, only if an archive was found or created, scans it
/// for a report file and persists `runsheet_report_found`.
///
/// `strict` is forwarded to [`run_discovery`] unchanged.
///
/// # Errors
///
/// Propagates anything [`run_discovery`] returns. Returns
/// [`WorkflowError::LocalProgrammingError`] if `report_pattern` fails to
/// compile as a regex (a configuration-validation bug, not an expected
/// runtime condition).
#[instrument(skip(cloud, leases, locations, config), fields(lease_id = %lease_id))]
pub async fn run_full_discovery<C, G, L, Locs>(
    lease_id: &LeaseId,
    strict: bool,
    cloud: &C,
    config: &G,
    leases: &L,
    locations: &Locs,
) -> Result<FullDiscoveryOutcome, WorkflowError>
where
    C: CloudPort,
    G: ConfigStore,
    L: LeaseRepository,
    Locs: CloudLocationRepository,
{
    let discovery = run_discovery(lease_id, strict, cloud, config, leases, locations).await?;

    if !discovery.found {
        return Ok(FullDiscoveryOutcome { discovery, report_found: None });
    }

    let cfg = config.load(&lease_id.agency).await?;
    let pattern = Regex::new(&cfg.report_detection_pattern)
        .map_err(|e| WorkflowError::LocalProgrammingError(format!("invalid report pattern: {e}")))?;

    let path = discovery.path.clone().expect("found implies a path");
    let detection = detect_report(&path, cloud, &pattern).await?;
    leases.set_report_found(lease_id, detection.found).await?;

    Ok(FullDiscoveryOutcome { discovery, report_found: Some(detection.found) })
}
