//! Workspace-namespace path routing.
//!
//! A path beginning with a known team-workspace name (e.g.
//! `/State Workspace/Archive/12345`) must be submitted to the provider as
//! the relative remainder (`/Archive/12345`) through a client parameterized
//! on that workspace's namespace id, while every caller-visible result keeps
//! the original absolute form. This module is the pure path-splitting and
//! namespace-cache half of that; [`crate::dropbox`] does the actual HTTP
//! calls the cache is filled from.

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::sync::RwLock;

// Layer 2: Third-party crate imports (none)

// Layer 3: Internal module imports (none)

/// The routing decision for a single absolute path: either submit it as-is
/// against the personal root, or submit the relative remainder against a
/// workspace namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Personal { path: String },
    Workspace { namespace_id: String, relative_path: String },
}

/// Splits `path` into its first segment and the remainder, the shape every
/// workspace-name lookup needs.
///
/// Returns `None` for the root path (`/` or empty), which has no leading
/// segment to test against the known-workspace set.
#[must_use]
pub fn split_leading_segment(path: &str) -> Option<(&str, &str)> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.split_once('/') {
        Some((head, rest)) => Some((head, rest)),
        None => Some((trimmed, "")),
    }
}

/// Caches the one-time "list shared folders" lookup mapping a workspace
/// display name to its namespace id, discovered once per process and
/// cached rather than re-fetched on every path resolution.
#[derive(Debug, Default)]
pub struct NamespaceCache {
    by_name: RwLock<HashMap<String, String>>,
}

impl NamespaceCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a workspace-name -> namespace-id mapping discovered via a
    /// "list shared folders" call.
    pub fn insert(&self, workspace_name: &str, namespace_id: &str) {
        self.by_name
            .write()
            .expect("namespace cache lock poisoned")
            .insert(workspace_name.to_string(), namespace_id.to_string());
    }

    #[must_use]
    pub fn get(&self, workspace_name: &str) -> Option<String> {
        self.by_name
            .read()
            .expect("namespace cache lock poisoned")
            .get(workspace_name)
            .cloned()
    }

    /// Resolves an absolute path into a [`Route`], consulting the cache for
    /// the leading segment. A path whose leading segment is not a cached
    /// workspace name routes to the personal root unchanged.
    #[must_use]
    pub fn route(&self, path: &str) -> Route {
        match split_leading_segment(path) {
            Some((head, rest)) => match self.get(head) {
                Some(namespace_id) => Route::Workspace {
                    namespace_id,
                    relative_path: if rest.is_empty() {
                        String::from("/")
                    } else {
                        format!("/{rest}")
                    },
                },
                None => Route::Personal { path: path.to_string() },
            },
            None => Route::Personal { path: path.to_string() },
        }
    }
}
