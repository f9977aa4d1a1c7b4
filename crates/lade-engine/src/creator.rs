//! `ArchiveCreator`: materializes a lease's archive directory tree.

// Layer 2: Third-party crate imports
use tracing::warn;

// Layer 3: Internal module imports
use lade_core::error::WorkflowError;
use lade_core::model::{archive_path, AgencyStorageConfig, CloudLocation, CloudLocationKey, CloudProvider, Lease};
use lade_core::traits::{CloudLocationRepository, CloudPort};

/// Outcome of an attempt to materialize a lease's archive directory.
/// `success = false` is a soft failure (empty `subfolders` config), never a
/// panic or an error variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveCreationResult {
    pub success: bool,
    pub path: String,
    pub share_url: Option<String>,
    pub cloud_location: Option<CloudLocationKey>,
}

/// Creates `lease`'s archive directory, its configured subfolders, and a
/// public share link, then upserts the resulting [`CloudLocation`].
///
/// Preconditions are checked in order, each producing a distinct terminal
/// outcome (§4.3): the base path must exist as a folder before anything
/// else is attempted, and an empty `subfolders` config is a soft failure
/// rather than a creation attempt.
///
/// # Errors
///
/// Returns [`WorkflowError::BasePathMissing`] if `cfg.runsheet_archive_base_path`
/// does not resolve to a folder, [`WorkflowError::DirectoryCreationFailed`]
/// if directory creation does not return an entry, or a propagated
/// [`WorkflowError::Cloud`]/[`WorkflowError::Persistence`] for any other
/// provider/storage failure.
pub async fn create_archive<C, L>(
    lease: &Lease,
    cloud: &C,
    locations: &L,
    cfg: &AgencyStorageConfig,
) -> Result<ArchiveCreationResult, WorkflowError>
where
    C: CloudPort,
    L: CloudLocationRepository,
{
    let dir = archive_path(&cfg.runsheet_archive_base_path, &lease.id.lease_number);

    let base = cloud.metadata(&cfg.runsheet_archive_base_path).await?;
    if !matches!(base, Some(entry) if entry.kind == lade_core::model::EntryKind::Folder) {
        return Err(WorkflowError::BasePathMissing(cfg.runsheet_archive_base_path.clone()));
    }

    if cfg.subfolders.is_empty() {
        warn!(agency = %cfg.agency, %dir, "subfolders config is empty, skipping archive creation");
        return Ok(ArchiveCreationResult { success: false, path: dir, share_url: None, cloud_location: None });
    }

    cloud
        .create_directory(&dir, true)
        .await
        .map_err(|e| WorkflowError::DirectoryCreationFailed(format!("{dir}: {e}")))?;

    cloud.create_directory_tree(&dir, &cfg.subfolders, true).await?;

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

    Ok(ArchiveCreationResult { success: true, path: dir, share_url: link.map(|l| l.url), cloud_location: Some(key) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lade_cloud::fake::FakeCloudPort;
    use lade_core::error::PersistenceError;
    use lade_core::model::LeaseId;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct InMemoryLocations {
        by_key: Mutex<HashMap<CloudLocationKey, CloudLocation>>,
    }

    #[async_trait]
    impl CloudLocationRepository for InMemoryLocations {
        async fn upsert(&self, location: CloudLocation) -> Result<(), PersistenceError> {
            self.by_key.lock().expect("lock poisoned").insert(location.key.clone(), location);
            Ok(())
        }

        async fn get(&self, key: &CloudLocationKey) -> Result<CloudLocation, PersistenceError> {
            self.by_key
                .lock()
                .expect("lock poisoned")
                .get(key)
                .cloned()
                .ok_or_else(|| PersistenceError::NotFound(key.path.clone()))
        }
    }

    fn cfg(subfolders: Vec<String>) -> AgencyStorageConfig {
        AgencyStorageConfig {
            agency: "NMSLO".into(),
            runsheet_archive_base_path: "/State Workspace/Archive".into(),
            subfolders,
            auto_create_runsheet_archives: true,
            enabled: true,
            report_detection_pattern: AgencyStorageConfig::DEFAULT_REPORT_PATTERN.into(),
        }
    }

    #[tokio::test]
    async fn missing_base_path_is_terminal() {
        let cloud = FakeCloudPort::new();
        let locations = InMemoryLocations::default();
        let lease = Lease::new(LeaseId::new("NMSLO", "12345"));

        let err = create_archive(&lease, &cloud, &locations, &cfg(vec!["Documents".into()])).await.unwrap_err();

        assert!(matches!(err, WorkflowError::BasePathMissing(_)));
        assert!(locations.by_key.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_subfolders_is_a_soft_failure_without_creating_anything() {
        let cloud = FakeCloudPort::new();
        cloud.seed_folder("/State Workspace/Archive");
        let locations = InMemoryLocations::default();
        let lease = Lease::new(LeaseId::new("NMSLO", "12345"));

        let result = create_archive(&lease, &cloud, &locations, &cfg(vec![])).await.unwrap();

        assert!(!result.success);
        assert!(cloud.metadata("/State Workspace/Archive/12345").await.unwrap().is_none());
        assert!(locations.by_key.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn full_materialization_creates_tree_link_and_upsert() {
        let cloud = FakeCloudPort::new();
        cloud.seed_folder("/State Workspace/Archive");
        let locations = InMemoryLocations::default();
        let lease = Lease::new(LeaseId::new("NMSLO", "12345"));
        let subfolders = vec!["Document Archive".to_string(), "MI Index".to_string(), "Runsheets".to_string()];

        let result = create_archive(&lease, &cloud, &locations, &cfg(subfolders)).await.unwrap();

        assert!(result.success);
        assert!(result.share_url.is_some());
        assert!(cloud
            .metadata("/State Workspace/Archive/12345/Document Archive")
            .await
            .unwrap()
            .is_some());
        assert!(cloud.metadata("/State Workspace/Archive/12345/Runsheets").await.unwrap().is_some());
        let key = result.cloud_location.unwrap();
        assert!(locations.get(&key).await.is_ok());
    }

    #[tokio::test]
    async fn rerunning_creation_is_idempotent() {
        let cloud = FakeCloudPort::new();
        cloud.seed_folder("/State Workspace/Archive");
        let locations = InMemoryLocations::default();
        let lease = Lease::new(LeaseId::new("NMSLO", "12345"));
        let subfolders = vec!["Documents".to_string()];

        let first = create_archive(&lease, &cloud, &locations, &cfg(subfolders.clone())).await.unwrap();
        let second = create_archive(&lease, &cloud, &locations, &cfg(subfolders)).await.unwrap();

        assert_eq!(first.path, second.path);
        assert_eq!(first.share_url, second.share_url);
    }
}
