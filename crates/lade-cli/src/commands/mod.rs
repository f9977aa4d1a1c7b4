//! # Command Handlers
//!
//! Contains the implementation modules for each CLI subcommand.
//!
//! Each command handler is an async function that returns `anyhow::Result<()>`
//! and delegates to the library crates (`lade-cloud`, `lade-persistence`,
//! `lade-engine`, `lade-jobs`). No business logic belongs here.
//!
//! - [`run_worker`] -- starts the job-runner worker pool.
//! - [`trigger`] -- fires the write-hook for one lease and awaits the job.
//! - [`config`] -- inspects agency storage configuration.

pub mod config;
pub mod run_worker;
pub mod trigger;

use std::sync::Arc;

use lade_cloud::{AccessToken, DropboxCloudPort, FakeCloudPort};
use lade_core::error::CloudError;
use lade_core::model::{Entry, ShareLink};
use lade_core::traits::CloudPort;

/// Builds the [`CloudPort`] a command should run against, behind a single
/// `Arc<dyn CloudPort>` so callers don't need to be generic over which
/// concrete client `--fake-cloud` selected.
///
/// # Errors
///
/// Returns an error if `dropbox_token` is absent and `fake_cloud` is false,
/// or if the underlying `reqwest::Client` fails to build.
pub fn build_cloud_port(fake_cloud: bool, dropbox_token: Option<&str>) -> anyhow::Result<Arc<dyn CloudPort>> {
    if fake_cloud {
        return Ok(Arc::new(FakeCloudPort::new()));
    }
    let token = dropbox_token.ok_or_else(|| {
        anyhow::anyhow!("--dropbox-token (or LADE_DROPBOX_TOKEN) is required unless --fake-cloud is set")
    })?;
    let client = DropboxCloudPort::new(AccessToken::new(lade_cloud::token::Token::new(token)))?;
    Ok(Arc::new(client))
}

/// Forwards [`CloudPort`] to the boxed trait object so `JobRunner`/workflow
/// code, which is generic over `C: CloudPort`, can be instantiated with
/// `Arc<dyn CloudPort>` at this one dynamic-dispatch seam.
#[async_trait::async_trait]
impl CloudPort for Arc<dyn CloudPort> {
    async fn metadata(&self, path: &str) -> Result<Option<Entry>, CloudError> {
        self.as_ref().metadata(path).await
    }

    async fn list_files(&self, path: &str) -> Result<Vec<Entry>, CloudError> {
        self.as_ref().list_files(path).await
    }

    async fn create_directory(&self, path: &str, parents: bool) -> Result<Entry, CloudError> {
        self.as_ref().create_directory(path, parents).await
    }

    async fn create_directory_tree(
        &self,
        root: &str,
        subfolders: &[String],
        exists_ok: bool,
    ) -> Result<Vec<Entry>, CloudError> {
        self.as_ref().create_directory_tree(root, subfolders, exists_ok).await
    }

    async fn create_share_link(&self, path: &str, is_public: bool) -> Result<Option<ShareLink>, CloudError> {
        self.as_ref().create_share_link(path, is_public).await
    }

    async fn search_by_name(&self, query: &str) -> Result<Vec<Entry>, CloudError> {
        self.as_ref().search_by_name(query).await
    }
}
