//! In-memory [`CloudPort`] for exercising `lade-engine`/`lade-jobs` tests
//! without a network dependency.

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::sync::Mutex;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use uuid::Uuid;

// Layer 3: Internal module imports
use lade_core::error::CloudError;
use lade_core::model::{Entry, EntryKind, ShareLink};
use lade_core::traits::CloudPort;

#[derive(Debug, Default)]
struct State {
    /// path -> entry, for both files and directories.
    entries: HashMap<String, Entry>,
    /// path -> existing share link.
    links: HashMap<String, ShareLink>,
    /// paths that should fail the next N calls with a transient error,
    /// consumed one at a time, used to simulate scenario 5 (transient
    /// failure then success).
    transient_failures_remaining: HashMap<String, u32>,
    /// paths that should sleep before responding, simulating a provider
    /// that never answers within a caller's hard timeout. Not consumed:
    /// every call touching the path hangs, across every retry attempt.
    hangs: HashMap<String, std::time::Duration>,
}

/// A deterministic, injectable [`CloudPort`] backed by an in-memory
/// directory tree. `base_paths` pre-seeds which paths `metadata` reports as
/// existing folders, mirroring the precondition `ArchiveCreator` checks.
#[derive(Debug)]
pub struct FakeCloudPort {
    state: Mutex<State>,
}

impl FakeCloudPort {
    #[must_use]
    pub fn new() -> Self {
        Self { state: Mutex::new(State::default()) }
    }

    /// Seeds `path` as an existing folder, as if an operator already
    /// created the agency's base path.
    pub fn seed_folder(&self, path: &str) {
        let mut state = self.state.lock().expect("fake cloud state lock poisoned");
        state.entries.insert(
            path.to_string(),
            Entry {
                kind: EntryKind::Folder,
                name: path.rsplit('/').next().unwrap_or(path).to_string(),
                path_display: path.to_string(),
                id: format!("id:{}", Uuid::new_v4()),
            },
        );
    }

    /// Seeds `path` as an existing file, e.g. a report artifact a test
    /// wants [`CloudPort::list_files`] to surface.
    pub fn seed_file(&self, path: &str) {
        let mut state = self.state.lock().expect("fake cloud state lock poisoned");
        state.entries.insert(
            path.to_string(),
            Entry {
                kind: EntryKind::File,
                name: path.rsplit('/').next().unwrap_or(path).to_string(),
                path_display: path.to_string(),
                id: format!("id:{}", Uuid::new_v4()),
            },
        );
    }

    /// Causes the next `count` calls to any operation touching `path` to
    /// fail with `CloudError::Transient`, then succeed normally.
    pub fn fail_next_n_times(&self, path: &str, count: u32) {
        self.state
            .lock()
            .expect("fake cloud state lock poisoned")
            .transient_failures_remaining
            .insert(path.to_string(), count);
    }

    /// Causes every future call touching `path` to sleep for `delay` before
    /// proceeding, for a caller's hard-timeout-exhaustion test.
    pub fn hang_on(&self, path: &str, delay: std::time::Duration) {
        self.state.lock().expect("fake cloud state lock poisoned").hangs.insert(path.to_string(), delay);
    }

    async fn maybe_hang(&self, path: &str) {
        let delay = self.state.lock().expect("fake cloud state lock poisoned").hangs.get(path).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn maybe_fail(&self, path: &str) -> Result<(), CloudError> {
        let mut state = self.state.lock().expect("fake cloud state lock poisoned");
        if let Some(remaining) = state.transient_failures_remaining.get_mut(path) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(CloudError::Transient(format!("injected failure for {path}")));
            }
        }
        Ok(())
    }

    fn children_of<'a>(state: &'a State, dir: &str) -> Vec<Entry> {
        let prefix = format!("{}/", dir.trim_end_matches('/'));
        state
            .entries
            .values()
            .filter(|e| {
                e.path_display.starts_with(&prefix)
                    && !e.path_display[prefix.len()..].contains('/')
            })
            .cloned()
            .collect::<Vec<_>>()
    }
}

impl Default for FakeCloudPort {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CloudPort for FakeCloudPort {
    async fn metadata(&self, path: &str) -> Result<Option<Entry>, CloudError> {
        self.maybe_fail(path)?;
        Ok(self.state.lock().expect("fake cloud state lock poisoned").entries.get(path).cloned())
    }

    async fn list_files(&self, path: &str) -> Result<Vec<Entry>, CloudError> {
        self.maybe_hang(path).await;
        self.maybe_fail(path)?;
        let state = self.state.lock().expect("fake cloud state lock poisoned");
        Ok(Self::children_of(&state, path))
    }

    async fn create_directory(&self, path: &str, _parents: bool) -> Result<Entry, CloudError> {
        self.maybe_fail(path)?;
        let mut state = self.state.lock().expect("fake cloud state lock poisoned");
        let entry = state.entries.entry(path.to_string()).or_insert_with(|| Entry {
            kind: EntryKind::Folder,
            name: path.rsplit('/').next().unwrap_or(path).to_string(),
            path_display: path.to_string(),
            id: format!("id:{}", Uuid::new_v4()),
        });
        Ok(entry.clone())
    }

    async fn create_directory_tree(
        &self,
        root: &str,
        subfolders: &[String],
        _exists_ok: bool,
    ) -> Result<Vec<Entry>, CloudError> {
        let mut created = Vec::with_capacity(subfolders.len());
        for sub in subfolders {
            created.push(self.create_directory(&format!("{root}/{sub}"), true).await?);
        }
        Ok(created)
    }

    async fn create_share_link(
        &self,
        path: &str,
        is_public: bool,
    ) -> Result<Option<ShareLink>, CloudError> {
        self.maybe_fail(path)?;
        let mut state = self.state.lock().expect("fake cloud state lock poisoned");
        if let Some(existing) = state.links.get(path) {
            return Ok(Some(existing.clone()));
        }
        let link = ShareLink {
            url: format!("https://www.dropbox.com/sh/fake/{}", Uuid::new_v4()),
            expires_at: None,
            is_public,
        };
        state.links.insert(path.to_string(), link.clone());
        Ok(Some(link))
    }

    async fn search_by_name(&self, query: &str) -> Result<Vec<Entry>, CloudError> {
        let needle = query.to_lowercase();
        let state = self.state.lock().expect("fake cloud state lock poisoned");
        Ok(state
            .entries
            .values()
            .filter(|e| e.name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn metadata_returns_none_for_unknown_path() {
        let cloud = FakeCloudPort::new();
        assert!(cloud.metadata("/nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_directory_is_idempotent() {
        let cloud = FakeCloudPort::new();
        let first = cloud.create_directory("/Archive/1", true).await.unwrap();
        let second = cloud.create_directory("/Archive/1", true).await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn share_link_is_reused_across_calls() {
        let cloud = FakeCloudPort::new();
        let first = cloud.create_share_link("/Archive/1", true).await.unwrap().unwrap();
        let second = cloud.create_share_link("/Archive/1", true).await.unwrap().unwrap();
        assert_eq!(first.url, second.url);
    }

    #[tokio::test]
    async fn fail_next_n_times_then_succeeds() {
        let cloud = FakeCloudPort::new();
        cloud.seed_folder("/Archive/1");
        cloud.fail_next_n_times("/Archive/1", 2);
        assert!(cloud.list_files("/Archive/1").await.is_err());
        assert!(cloud.list_files("/Archive/1").await.is_err());
        assert!(cloud.list_files("/Archive/1").await.is_ok());
    }

    #[tokio::test]
    async fn search_by_name_matches_case_insensitively() {
        let cloud = FakeCloudPort::new();
        cloud.seed_folder("/Archive/12345");
        let matches = cloud.search_by_name("12345").await.unwrap();
        assert_eq!(matches.len(), 1);
    }

    #[tokio::test]
    async fn list_files_only_returns_direct_children() {
        let cloud = FakeCloudPort::new();
        cloud.seed_file("/Archive/1/report.pdf");
        cloud.seed_file("/Archive/1/Documents/nested.pdf");
        let files = cloud.list_files("/Archive/1").await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "report.pdf");
    }
}
