//! `ArchiveFinder`: read-only search for a lease's archive directory.

// Layer 1: Standard library imports
// (none for this module)

// Layer 2: Third-party crate imports
use async_trait::async_trait;

// Layer 3: Internal module imports
use lade_core::error::WorkflowError;
use lade_core::model::{archive_path, AgencyStorageConfig, CloudLocation, CloudLocationKey, CloudProvider, Lease};
use lade_core::traits::{CloudLocationRepository, CloudPort};

/// Outcome of a search for a lease's archive directory. Never carries an
/// error by itself: "not found" is a normal result, not a failure (§4.2
/// guarantee).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSearchResult {
    pub found: bool,
    pub path: String,
    pub share_url: Option<String>,
    pub cloud_location: Option<CloudLocationKey>,
}

/// Searches for `lease`'s archive directory under `cfg.runsheet_archive_base_path`.
///
/// Performs no writes when the directory is not found: no directory
/// creation, no database upsert. All provider errors propagate as
/// [`WorkflowError::Cloud`], which the caller treats as retryable per the
/// error taxonomy.
///
/// # Errors
///
/// Returns [`WorkflowError::Cloud`] if any `CloudPort` call fails, or
/// [`WorkflowError::Persistence`] if the location upsert fails on the
/// found path.
pub async fn find_archive<C, L>(
    lease: &Lease,
    cloud: &C,
    locations: &L,
    cfg: &AgencyStorageConfig,
) -> Result<ArchiveSearchResult, WorkflowError>
where
    C: CloudPort,
    L: CloudLocationRepository,
{
    let dir = archive_path(&cfg.runsheet_archive_base_path, &lease.id.lease_number);

    let entries = cloud.list_files(&dir).await?;
    if entries.is_empty() {
        return Ok(ArchiveSearchResult { found: false, path: dir, share_url: None, cloud_location: None });
    }

    let link = cloud.create_share_link(&dir, true).await?;
    let key = CloudLocationKey::new(CloudProvider::Dropbox, dir.clone());
    locations
        .upsert(CloudLocation {
            key: key.clone(),
            name: lease.id.lease_number.clone(),
            is_directory: true,
            share_url: link.as_ref().map(|l| l.url.clone()),
            share_expires_at: link.as_ref().and_then(|l| l.expires_at),
            is_public: link.as_ref().is_some_and(|l| l.is_public),
            last_synced_at: chrono::Utc::now(),
        })
        .await?;

    Ok(ArchiveSearchResult {
        found: true,
        path: dir,
        share_url: link.map(|l| l.url),
        cloud_location: Some(key),
    })
}
