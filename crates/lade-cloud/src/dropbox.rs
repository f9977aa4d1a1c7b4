//! Production [`lade_core::traits::CloudPort`] implementation over the
//! Dropbox HTTP API.

// Layer 1: Standard library imports
use std::time::Duration;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

// Layer 3: Internal module imports
use lade_core::error::CloudError;
use lade_core::model::{Entry, EntryKind, ShareLink};
use lade_core::traits::CloudPort;

use crate::token::AccessToken;
use crate::workspace::{NamespaceCache, Route};

const API_BASE: &str = "https://api.dropboxapi.com/2";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A Dropbox-backed [`CloudPort`], aware of team-workspace namespace
/// routing.
#[derive(Debug, Clone)]
pub struct DropboxCloudPort {
    http: Client,
    token: AccessToken,
    namespaces: std::sync::Arc<NamespaceCache>,
}

impl DropboxCloudPort {
    /// Builds a client with a bounded per-request timeout (≤10 s).
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Http`] if the underlying `reqwest::Client`
    /// fails to build (TLS backend initialization failure).
    pub fn new(token: AccessToken) -> Result<Self, CloudError> {
        let http = Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CloudError::Http(e.to_string()))?;
        Ok(Self { http, token, namespaces: std::sync::Arc::new(NamespaceCache::new()) })
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.token.load().bearer)
    }

    /// Resolves `path` to a request target: the path to submit and, for a
    /// workspace route, the `Dropbox-API-Path-Root` header value.
    async fn resolve(&self, path: &str) -> Result<(String, Option<String>), CloudError> {
        match self.namespaces.route(path) {
            Route::Personal { path } => Ok((path, None)),
            Route::Workspace { namespace_id, relative_path } => {
                let path_root = json!({ ".tag": "namespace_id", "namespace_id": namespace_id });
                Ok((relative_path, Some(path_root.to_string())))
            }
        }
    }

    /// Populates the namespace cache via `sharing/list_folders`, a one-time,
    /// cacheable lookup of every team workspace's display name to its
    /// namespace id.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError`] on transport, auth, or rate-limit failure.
    pub async fn discover_workspaces(&self) -> Result<(), CloudError> {
        #[derive(Deserialize)]
        struct ListFoldersResponse {
            entries: Vec<SharedFolder>,
        }
        #[derive(Deserialize)]
        struct SharedFolder {
            name: String,
            shared_folder_id: String,
        }

        let resp: ListFoldersResponse = self
            .post_json("sharing/list_folders", &json!({ "limit": 1000 }), None)
            .await?;
        for folder in resp.entries {
            self.namespaces.insert(&folder.name, &folder.shared_folder_id);
        }
        Ok(())
    }

    async fn post_json<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        body: &serde_json::Value,
        path_root: Option<String>,
    ) -> Result<T, CloudError> {
        let mut request = self
            .http
            .post(format!("{API_BASE}/{endpoint}"))
            .header("Authorization", self.bearer())
            .json(body);
        if let Some(path_root) = path_root {
            request = request.header("Dropbox-API-Path-Root", path_root);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() {
                CloudError::Transient(e.to_string())
            } else {
                CloudError::Http(e.to_string())
            }
        })?;

        match response.status() {
            StatusCode::OK => response
                .json::<T>()
                .await
                .map_err(|e| CloudError::Http(format!("decode failure: {e}"))),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(CloudError::Auth(response.status().to_string()))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after_secs = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(60);
                Err(CloudError::RateLimited { retry_after_secs })
            }
            status if status.is_server_error() => {
                Err(CloudError::Transient(format!("server error: {status}")))
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(CloudError::Http(format!("unexpected status {status}: {body}")))
            }
        }
    }
}

#[derive(Deserialize)]
struct Metadata {
    #[serde(rename = ".tag")]
    tag: String,
    name: String,
    id: String,
    path_display: Option<String>,
}

fn metadata_to_entry(meta: Metadata, original_path: &str) -> Entry {
    Entry {
        kind: if meta.tag == "folder" { EntryKind::Folder } else { EntryKind::File },
        name: meta.name,
        // §4.1 step 3: always return the original absolute path, never the
        // namespace-relative form the provider echoes back.
        path_display: meta.path_display.unwrap_or_else(|| original_path.to_string()),
        id: meta.id,
    }
}

#[async_trait]
impl CloudPort for DropboxCloudPort {
    async fn metadata(&self, path: &str) -> Result<Option<Entry>, CloudError> {
        let (resolved_path, path_root) = self.resolve(path).await?;
        #[derive(Serialize)]
        struct Req<'a> {
            path: &'a str,
        }

        let result = self
            .post_json::<Metadata>("files/get_metadata", &json!(Req { path: &resolved_path }), path_root)
            .await;

        match result {
            Ok(meta) => Ok(Some(metadata_to_entry(meta, path))),
            Err(CloudError::Http(msg)) if msg.contains("not_found") => Ok(None),
            Err(other) => Err(other),
        }
    }

    async fn list_files(&self, path: &str) -> Result<Vec<Entry>, CloudError> {
        let (resolved_path, path_root) = self.resolve(path).await?;
        #[derive(Deserialize)]
        struct ListFolderResponse {
            entries: Vec<Metadata>,
            cursor: String,
            has_more: bool,
        }

        let mut all = Vec::new();
        let mut response: ListFolderResponse = self
            .post_json(
                "files/list_folder",
                &json!({ "path": resolved_path, "recursive": false }),
                path_root.clone(),
            )
            .await?;

        loop {
            all.extend(response.entries.drain(..).map(|m| metadata_to_entry(m, path)));
            if !response.has_more {
                break;
            }
            response = self
                .post_json(
                    "files/list_folder/continue",
                    &json!({ "cursor": response.cursor }),
                    path_root.clone(),
                )
                .await?;
        }
        Ok(all)
    }

    async fn create_directory(&self, path: &str, parents: bool) -> Result<Entry, CloudError> {
        let (resolved_path, path_root) = self.resolve(path).await?;
        #[derive(Deserialize)]
        struct CreateFolderResponse {
            metadata: Metadata,
        }

        let result = self
            .post_json::<CreateFolderResponse>(
                "files/create_folder_v2",
                &json!({ "path": resolved_path, "autorename": false }),
                path_root.clone(),
            )
            .await;

        match result {
            Ok(resp) => Ok(metadata_to_entry(resp.metadata, path)),
            // Idempotent: an existing directory is success, not failure.
            Err(CloudError::Http(msg)) if msg.contains("path/conflict") => {
                debug!(%path, "create_directory: already exists, treating as success");
                self.metadata(path).await?.ok_or_else(|| {
                    CloudError::Http(format!("conflict reported but metadata missing for {path}"))
                })
            }
            Err(CloudError::Http(msg)) if parents && msg.contains("not_found") => {
                warn!(%path, "create_directory: ancestor missing despite parents=true");
                Err(CloudError::Http(msg))
            }
            Err(other) => Err(other),
        }
    }

    async fn create_directory_tree(
        &self,
        root: &str,
        subfolders: &[String],
        exists_ok: bool,
    ) -> Result<Vec<Entry>, CloudError> {
        let mut created = Vec::with_capacity(subfolders.len());
        for sub in subfolders {
            let child_path = format!("{root}/{sub}");
            match self.create_directory(&child_path, true).await {
                Ok(entry) => created.push(entry),
                Err(e) if exists_ok && matches!(e, CloudError::Http(ref m) if m.contains("conflict")) => {
                    if let Some(entry) = self.metadata(&child_path).await? {
                        created.push(entry);
                    }
                }
                Err(e) => return Err(e),
            }
        }
        Ok(created)
    }

    async fn create_share_link(
        &self,
        path: &str,
        is_public: bool,
    ) -> Result<Option<ShareLink>, CloudError> {
        let route = self.namespaces.route(path);

        // Existing-link lookup is always attempted first (design note:
        // reuse over recreate).
        #[derive(Deserialize)]
        struct ListSharedLinksResponse {
            links: Vec<SharedLinkMetadata>,
        }
        #[derive(Deserialize)]
        struct SharedLinkMetadata {
            url: String,
            #[serde(default)]
            expires: Option<String>,
        }

        let (resolved_path, path_root) = self.resolve(path).await?;
        let existing: ListSharedLinksResponse = self
            .post_json(
                "sharing/list_shared_links",
                &json!({ "path": resolved_path, "direct_only": true }),
                path_root.clone(),
            )
            .await?;
        if let Some(link) = existing.links.into_iter().next() {
            return Ok(Some(ShareLink {
                url: link.url,
                expires_at: link.expires.and_then(|e| e.parse().ok()),
                is_public,
            }));
        }

        // Critical quirk (§4.1): workspace-namespaced paths must be shared
        // by file id, not path.
        let share_target = match route {
            Route::Workspace { .. } => {
                let entry = self.metadata(path).await?.ok_or_else(|| {
                    CloudError::Http(format!("cannot share nonexistent path {path}"))
                })?;
                entry.id
            }
            Route::Personal { .. } => resolved_path,
        };

        #[derive(Deserialize)]
        struct CreateSharedLinkResponse {
            url: String,
            #[serde(default)]
            expires: Option<String>,
        }
        let created: Result<CreateSharedLinkResponse, CloudError> = self
            .post_json(
                "sharing/create_shared_link_with_settings",
                &json!({
                    "path": share_target,
                    "settings": { "requested_visibility": if is_public { "public" } else { "team_only" } }
                }),
                path_root,
            )
            .await;

        match created {
            Ok(resp) => Ok(Some(ShareLink {
                url: resp.url,
                expires_at: resp.expires.and_then(|e| e.parse().ok()),
                is_public,
            })),
            Err(CloudError::Http(msg)) if msg.contains("shared_link_already_exists") => {
                warn!(%path, "share link race: another caller created one first");
                Ok(None)
            }
            Err(other) => Err(other),
        }
    }

    async fn search_by_name(&self, query: &str) -> Result<Vec<Entry>, CloudError> {
        #[derive(Deserialize)]
        struct SearchV2Response {
            matches: Vec<SearchMatch>,
            has_more: bool,
            cursor: Option<String>,
        }
        #[derive(Deserialize)]
        struct SearchMatch {
            metadata: MatchMetadata,
        }
        #[derive(Deserialize)]
        struct MatchMetadata {
            metadata: Metadata,
        }

        let mut all = Vec::new();
        let mut response: SearchV2Response = self
            .post_json(
                "files/search_v2",
                &json!({ "query": query, "options": { "max_results": 100 } }),
                None,
            )
            .await?;

        loop {
            all.extend(
                response
                    .matches
                    .drain(..)
                    .map(|m| metadata_to_entry(m.metadata.metadata, "")),
            );
            if !response.has_more {
                break;
            }
            let Some(cursor) = response.cursor.take() else { break };
            response = self
                .post_json("files/search/continue_v2", &json!({ "cursor": cursor }), None)
                .await?;
        }
        Ok(all)
    }
}
