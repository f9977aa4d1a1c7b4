//! Workspace-aware Dropbox implementation of [`lade_core::traits::CloudPort`].
//!
//! ## Module Structure
//!
//! - [`token`] — the copy-on-refresh access-token cell shared by the client
//!   and whatever background credential rotator refreshes it.
//! - [`workspace`] — the path-splitting and namespace-id-caching logic
//!   behind team-workspace path resolution.
//! - [`dropbox`] — the production [`dropbox::DropboxCloudPort`].
//! - [`fake`] — an in-memory [`fake::FakeCloudPort`] for tests in
//!   `lade-engine`/`lade-jobs` that must not hit the network.

pub mod dropbox;
pub mod fake;
pub mod token;
pub mod workspace;

pub use dropbox::DropboxCloudPort;
pub use fake::FakeCloudPort;
pub use token::AccessToken;
