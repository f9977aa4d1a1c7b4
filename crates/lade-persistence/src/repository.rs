//! JSON-file-backed [`LeaseRepository`] and [`CloudLocationRepository`].
//!
//! The OLTP schema these would normally target is explicitly out of scope,
//! so records are stored as one JSON file per key under a data directory.
//! Writes go through a per-key `tokio::sync::Mutex` (serializing concurrent
//! writers to the same record, satisfying invariant #4: no interleaved
//! partial writes) and land via write-to-temp-then-rename so a crash never
//! leaves a half-written file in place of a good one.

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex as StdMutex;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

// Layer 3: Internal module imports
use lade_core::error::PersistenceError;
use lade_core::model::{CloudLocation, CloudLocationKey, Lease, LeaseId};
use lade_core::traits::{CloudLocationRepository, LeaseRepository};

/// Escapes a string for use as a filename component: anything that isn't
/// alphanumeric, `-`, or `_` becomes `_`.
fn escape_for_filename(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

async fn write_atomically(path: &Path, contents: &str) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| PersistenceError::Storage(format!("failed to create directory: {e}")))?;
    }
    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, contents)
        .await
        .map_err(|e| PersistenceError::Storage(format!("failed to write temp file: {e}")))?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| PersistenceError::Storage(format!("failed to rename into place: {e}")))?;
    Ok(())
}

async fn read_json<T: serde::de::DeserializeOwned>(
    path: &Path,
    not_found: impl FnOnce() -> PersistenceError,
) -> Result<T, PersistenceError> {
    let contents = tokio::fs::read_to_string(path).await.map_err(|_| not_found())?;
    serde_json::from_str(&contents)
        .map_err(|e| PersistenceError::Serialization(format!("failed to parse {}: {e}", path.display())))
}

/// Per-key lock registry so concurrent writers to the *same* record
/// serialize, while writers to different records proceed independently.
struct KeyLocks {
    locks: StdMutex<HashMap<String, std::sync::Arc<Mutex<()>>>>,
}

impl KeyLocks {
    fn new() -> Self {
        Self { locks: StdMutex::new(HashMap::new()) }
    }

    fn lock_for(&self, key: &str) -> std::sync::Arc<Mutex<()>> {
        let mut locks = self.locks.lock().expect("key lock registry poisoned");
        locks.entry(key.to_string()).or_insert_with(|| std::sync::Arc::new(Mutex::new(()))).clone()
    }
}

impl std::fmt::Debug for KeyLocks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyLocks").finish_non_exhaustive()
    }
}

/// JSON-file-backed [`LeaseRepository`]. One file per lease at
/// `{root}/leases/{agency}__{lease_number}.json`.
#[derive(Debug)]
pub struct JsonFileLeaseRepository {
    root: PathBuf,
    locks: KeyLocks,
}

impl JsonFileLeaseRepository {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), locks: KeyLocks::new() }
    }

    fn path_for(&self, id: &LeaseId) -> PathBuf {
        self.root
            .join("leases")
            .join(format!("{}__{}.json", escape_for_filename(&id.agency), escape_for_filename(&id.lease_number)))
    }

    /// Creates a lease record with default (unset) task-managed fields,
    /// used by tests and the upstream-ingestion seam `lade-cli` exposes.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the write fails.
    pub async fn seed(&self, lease: Lease) -> Result<(), PersistenceError> {
        let path = self.path_for(&lease.id);
        let json = serde_json::to_string_pretty(&lease)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;
        write_atomically(&path, &json).await
    }
}

#[async_trait]
impl LeaseRepository for JsonFileLeaseRepository {
    async fn get(&self, id: &LeaseId) -> Result<Lease, PersistenceError> {
        let path = self.path_for(id);
        read_json(&path, || PersistenceError::NotFound(id.to_string())).await
    }

    async fn set_archive_and_link(
        &self,
        id: &LeaseId,
        archive: CloudLocationKey,
        link: Option<String>,
    ) -> Result<(), PersistenceError> {
        let lock = self.locks.lock_for(&id.to_string());
        let _guard = lock.lock().await;

        let mut lease = self.get(id).await?;
        lease.runsheet_archive = Some(archive);
        lease.runsheet_link = link;
        let path = self.path_for(id);
        let json = serde_json::to_string_pretty(&lease)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;
        write_atomically(&path, &json).await
    }

    async fn set_report_found(&self, id: &LeaseId, found: bool) -> Result<(), PersistenceError> {
        let lock = self.locks.lock_for(&id.to_string());
        let _guard = lock.lock().await;

        let mut lease = self.get(id).await?;
        lease.runsheet_report_found = found;
        let path = self.path_for(id);
        let json = serde_json::to_string_pretty(&lease)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;
        write_atomically(&path, &json).await
    }
}

/// JSON-file-backed [`CloudLocationRepository`]. One file per location at
/// `{root}/cloud_locations/{provider}__{escaped_path}.json`.
#[derive(Debug)]
pub struct JsonFileCloudLocationRepository {
    root: PathBuf,
    locks: KeyLocks,
}

impl JsonFileCloudLocationRepository {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), locks: KeyLocks::new() }
    }

    fn path_for(&self, key: &CloudLocationKey) -> PathBuf {
        self.root
            .join("cloud_locations")
            .join(format!("{}__{}.json", key.provider, escape_for_filename(&key.path)))
    }
}

#[async_trait]
impl CloudLocationRepository for JsonFileCloudLocationRepository {
    async fn upsert(&self, mut location: CloudLocation) -> Result<(), PersistenceError> {
        let key_str = format!("{}:{}", location.key.provider, location.key.path);
        let lock = self.locks.lock_for(&key_str);
        let _guard = lock.lock().await;

        location.last_synced_at = Utc::now();
        let path = self.path_for(&location.key);
        let json = serde_json::to_string_pretty(&location)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;
        write_atomically(&path, &json).await
    }

    async fn get(&self, key: &CloudLocationKey) -> Result<CloudLocation, PersistenceError> {
        let path = self.path_for(key);
        read_json(&path, || PersistenceError::NotFound(format!("{}:{}", key.provider, key.path))).await
    }
}
