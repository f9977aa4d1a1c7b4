//! Domain entities for the archive-discovery pipeline.
//!
//! Every type here is plain data — no I/O, no provider-specific behavior.
//! Implementations in `lade-cloud`/`lade-persistence`/`lade-engine` operate
//! on these types through the traits in [`crate::traits`].

// Layer 1: Standard library imports
use std::fmt;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A regulatory authority identifying which storage configuration applies.
///
/// Agencies are an open set in the source system; LADE treats the agency as
/// an opaque, case-sensitive key rather than enumerating known values, so a
/// new agency can be onboarded by configuration alone.
pub type Agency = String;

/// Identity of a lease: the (agency, lease_number) pair LADE never mutates
/// and uses as the stable key for both configuration lookup and archive path
/// derivation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeaseId {
    pub agency: Agency,
    pub lease_number: String,
}

impl LeaseId {
    #[must_use]
    pub fn new(agency: impl Into<Agency>, lease_number: impl Into<String>) -> Self {
        Self {
            agency: agency.into(),
            lease_number: lease_number.into(),
        }
    }
}

impl fmt::Display for LeaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.agency, self.lease_number)
    }
}

/// A mineral/title record and the task-managed fields LADE owns.
///
/// Created and mutated by upstream ingestion; LADE never deletes a lease and
/// only ever writes to `runsheet_archive`, `runsheet_link`, and
/// `runsheet_report_found` (invariant: persistence touches only this field
/// set).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lease {
    pub id: LeaseId,
    /// Path identity of the lease's archive directory, once discovered or
    /// created. `None` until a workflow run succeeds.
    pub runsheet_archive: Option<CloudLocationKey>,
    /// Public share URL for the archive directory. When set, invariant #2
    /// requires the referenced `CloudLocation.share_url` to match.
    pub runsheet_link: Option<String>,
    /// Whether a report-matching file was last found in the archive.
    /// Left unchanged by transient errors (invariant #3).
    pub runsheet_report_found: bool,
}

impl Lease {
    #[must_use]
    pub const fn new(id: LeaseId) -> Self {
        Self {
            id,
            runsheet_archive: None,
            runsheet_link: None,
            runsheet_report_found: false,
        }
    }
}

/// Per-agency storage configuration (`ConfigStore`'s unit of record).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgencyStorageConfig {
    pub agency: Agency,
    /// Absolute, normalized base path (one leading slash, no trailing
    /// slash) under which every lease's archive directory is created.
    pub runsheet_archive_base_path: String,
    /// Ordered subfolder names created under each lease's archive
    /// directory. Each entry is normalized (slashes stripped, blanks
    /// dropped) before use.
    pub subfolders: Vec<String>,
    pub auto_create_runsheet_archives: bool,
    pub enabled: bool,
    /// Case-insensitive pattern used by `ReportDetector`. Stored as a
    /// string here (zero I/O, zero regex dependency in `lade-core`);
    /// compiled by the consumer.
    pub report_detection_pattern: String,
}

impl AgencyStorageConfig {
    /// The pattern used when an agency config doesn't specify one.
    pub const DEFAULT_REPORT_PATTERN: &'static str = r"(?i).*master documents.*";

    /// Normalizes `runsheet_archive_base_path` and every subfolder entry in
    /// place: strips trailing slashes from the base path, strips leading and
    /// trailing slashes from subfolders, and drops blank subfolder entries.
    pub fn normalize(&mut self) {
        self.runsheet_archive_base_path = normalize_base_path(&self.runsheet_archive_base_path);
        self.subfolders = self
            .subfolders
            .iter()
            .map(|s| s.trim_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
}

/// Normalizes a path to exactly one leading slash and no trailing slash.
#[must_use]
pub fn normalize_base_path(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Joins a base path and a lease number into the canonical archive path,
/// applying the same normalization as [`normalize_base_path`].
#[must_use]
pub fn archive_path(base_path: &str, lease_number: &str) -> String {
    let base = normalize_base_path(base_path);
    format!("{base}/{lease_number}")
}

/// Storage provider identity. LADE's reference deployment has exactly one
/// variant in production; modeled as an enum (rather than a free-form
/// string) so a second provider can be added without touching every call
/// site that matches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloudProvider {
    Dropbox,
}

impl fmt::Display for CloudProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dropbox => write!(f, "dropbox"),
        }
    }
}

/// The natural key of a `CloudLocation`: `(provider, path)`. Leases hold
/// this rather than an owned `CloudLocation` so the location stays
/// independently upsertable (design note: "Lease holds a weak reference").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CloudLocationKey {
    pub provider: CloudProvider,
    pub path: String,
}

impl CloudLocationKey {
    #[must_use]
    pub fn new(provider: CloudProvider, path: impl Into<String>) -> Self {
        Self {
            provider,
            path: path.into(),
        }
    }
}

/// A durable record of a directory (or file) at the provider, including its
/// share-link state. Upserted by `(provider, path)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudLocation {
    pub key: CloudLocationKey,
    pub name: String,
    pub is_directory: bool,
    pub share_url: Option<String>,
    pub share_expires_at: Option<DateTime<Utc>>,
    pub is_public: bool,
    /// Set on every upsert; lets tests observe whether an upsert actually
    /// ran without depending on provider-side effects.
    pub last_synced_at: DateTime<Utc>,
}

/// An entry returned by `CloudPort::metadata`/`list_files`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub kind: EntryKind,
    pub name: String,
    /// Path as returned by the provider, always rewritten to the original
    /// absolute form even when the request was routed through a workspace
    /// namespace (§4.1 step 3).
    pub path_display: String,
    /// Provider file identifier. Required to create a share link for
    /// workspace-namespaced paths; present for both files and folders.
    pub id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    File,
    Folder,
}

/// Result of `CloudPort::create_share_link`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareLink {
    pub url: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_public: bool,
}

/// A job on the queue, scoped to one (task, lease) execution attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowJob {
    pub task_name: String,
    pub lease_id: LeaseId,
    pub user_id: String,
    pub attempt: u32,
    pub enqueued_at: DateTime<Utc>,
    pub dedup_key: String,
    /// Earliest time a worker may start this attempt; backoff delays push
    /// this forward on retry.
    pub not_before: DateTime<Utc>,
}

impl WorkflowJob {
    /// Builds the task-scoped dedup key `dedup:task:{task_name}:lease:{lease_id}`.
    #[must_use]
    pub fn dedup_key_for(task_name: &str, lease_id: &LeaseId) -> String {
        format!("dedup:task:{task_name}:lease:{lease_id}")
    }
}

/// Lifecycle state of a queued job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Queued,
    Running,
    Done,
    FailedRetryable,
    FailedTerminal,
    TimedOut,
}

impl JobState {
    /// Terminal states end the job's lifetime; no further transition occurs.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::FailedTerminal)
    }
}
