//! # LADE Persistence
//!
//! Implements the persistence-facing traits defined in `lade-core`:
//!
//! - [`config`] — [`config::TomlConfigStore`], a `ConfigStore` backed by
//!   per-agency TOML files with a reload-on-demand cache.
//! - [`repository`] — [`repository::JsonFileLeaseRepository`] and
//!   [`repository::JsonFileCloudLocationRepository`], JSON-file-backed
//!   repositories with per-key write serialization and atomic
//!   write-then-rename, since the OLTP schema these would normally target
//!   is out of scope here.
//! - [`dedup`] — [`dedup::InMemoryDedupStore`], the TTL compare-and-set
//!   store `lade-jobs` uses for deduplication.
//!
//! ## File Layout
//!
//! ```text
//! {data_dir}/
//!   agencies/{agency}.toml        # AgencyStorageConfig, one file per agency
//!   leases/{agency}__{lease_number}.json
//!   cloud_locations/{provider}__{escaped_path}.json
//! ```

pub mod config;
pub mod dedup;
pub mod repository;

pub use config::TomlConfigStore;
pub use dedup::InMemoryDedupStore;
pub use repository::{JsonFileCloudLocationRepository, JsonFileLeaseRepository};
