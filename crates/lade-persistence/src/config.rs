//! TOML-backed [`ConfigStore`] implementation.
//!
//! Each agency's [`AgencyStorageConfig`] lives at
//! `{root}/agencies/{agency}.toml`. Loads are cached until the caller (or an
//! operator command) calls [`TomlConfigStore::reload`], satisfying the
//! "hot-reloadable" requirement without a filesystem watcher.

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

// Layer 3: Internal module imports
use lade_core::error::ConfigError;
use lade_core::model::AgencyStorageConfig;
use lade_core::traits::ConfigStore;

/// On-disk shape of an agency's TOML file. Kept distinct from
/// [`AgencyStorageConfig`] so defaulting (`auto_create_runsheet_archives`,
/// `enabled`, `report_detection_pattern`) happens at the deserialization
/// boundary rather than leaking `#[serde(default)]` into the domain type.
///
/// Subfolders are three named, optional slots rather than an anonymous
/// list, mirroring the source Django model's
/// `runsheet_subfolder_{documents,misc_index,runsheets}_name` fields. A
/// blank or absent slot is dropped rather than creating an empty-named
/// subfolder; order is fixed (documents, misc index, runsheets) since that
/// is the order the source always creates them in.
#[derive(Debug, Deserialize, Serialize)]
struct AgencyConfigFile {
    agency: String,
    runsheet_archive_base_path: String,
    #[serde(default)]
    runsheet_subfolder_documents_name: Option<String>,
    #[serde(default)]
    runsheet_subfolder_misc_index_name: Option<String>,
    #[serde(default)]
    runsheet_subfolder_runsheets_name: Option<String>,
    #[serde(default = "default_true")]
    auto_create_runsheet_archives: bool,
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default = "default_pattern")]
    report_detection_pattern: String,
}

const fn default_true() -> bool {
    true
}

fn default_pattern() -> String {
    AgencyStorageConfig::DEFAULT_REPORT_PATTERN.to_string()
}

impl AgencyConfigFile {
    /// Flattens the three named subfolder slots into the ordered list
    /// `AgencyStorageConfig::normalize` operates on, dropping any slot that
    /// is absent or blank.
    fn flattened_subfolders(&self) -> Vec<String> {
        [
            &self.runsheet_subfolder_documents_name,
            &self.runsheet_subfolder_misc_index_name,
            &self.runsheet_subfolder_runsheets_name,
        ]
        .into_iter()
        .filter_map(|slot| slot.clone())
        .filter(|s| !s.trim().is_empty())
        .collect()
    }
}

impl From<AgencyConfigFile> for AgencyStorageConfig {
    fn from(file: AgencyConfigFile) -> Self {
        let subfolders = file.flattened_subfolders();
        let mut cfg = Self {
            agency: file.agency,
            runsheet_archive_base_path: file.runsheet_archive_base_path,
            subfolders,
            auto_create_runsheet_archives: file.auto_create_runsheet_archives,
            enabled: file.enabled,
            report_detection_pattern: file.report_detection_pattern,
        };
        cfg.normalize();
        cfg
    }
}

/// Maps an in-memory [`AgencyStorageConfig`]'s ordered `subfolders` list
/// back onto the three named on-disk slots, in order. Any entry past the
/// third is dropped rather than silently merged into the last slot, since
/// the on-disk schema has exactly three named positions.
fn unflatten_subfolders(subfolders: &[String]) -> (Option<String>, Option<String>, Option<String>) {
    let mut iter = subfolders.iter().cloned();
    (iter.next(), iter.next(), iter.next())
}

/// A [`ConfigStore`] that reads `{root}/agencies/{agency}.toml`.
#[derive(Debug)]
pub struct TomlConfigStore {
    root: PathBuf,
    cache: RwLock<HashMap<String, AgencyStorageConfig>>,
}

impl TomlConfigStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), cache: RwLock::new(HashMap::new()) }
    }

    fn file_path(&self, agency: &str) -> PathBuf {
        self.root.join("agencies").join(format!("{agency}.toml"))
    }

    async fn read_from_disk(&self, agency: &str) -> Result<AgencyStorageConfig, ConfigError> {
        let path = self.file_path(agency);
        let contents = tokio::fs::read_to_string(&path).await.map_err(|_| ConfigError::Missing {
            agency: agency.to_string(),
        })?;
        let file: AgencyConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::Invalid {
            agency: agency.to_string(),
            reason: e.to_string(),
        })?;
        if file.agency != agency {
            return Err(ConfigError::Invalid {
                agency: agency.to_string(),
                reason: format!(
                    "file {} declares agency {:?}, expected {:?}",
                    path.display(),
                    file.agency,
                    agency
                ),
            });
        }
        Ok(file.into())
    }

    /// Writes `cfg` to disk and primes the cache, used by tests and
    /// `lade-cli`'s `config show`/seed commands.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the parent directory cannot be
    /// created or the file cannot be written.
    pub async fn save(&self, cfg: &AgencyStorageConfig) -> Result<(), ConfigError> {
        let path = self.file_path(&cfg.agency);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| ConfigError::Invalid {
                agency: cfg.agency.clone(),
                reason: e.to_string(),
            })?;
        }
        let (documents, misc_index, runsheets) = unflatten_subfolders(&cfg.subfolders);
        let file = AgencyConfigFile {
            agency: cfg.agency.clone(),
            runsheet_archive_base_path: cfg.runsheet_archive_base_path.clone(),
            runsheet_subfolder_documents_name: documents,
            runsheet_subfolder_misc_index_name: misc_index,
            runsheet_subfolder_runsheets_name: runsheets,
            auto_create_runsheet_archives: cfg.auto_create_runsheet_archives,
            enabled: cfg.enabled,
            report_detection_pattern: cfg.report_detection_pattern.clone(),
        };
        let toml_text = toml::to_string_pretty(&file).map_err(|e| ConfigError::Invalid {
            agency: cfg.agency.clone(),
            reason: e.to_string(),
        })?;
        tokio::fs::write(&path, toml_text).await.map_err(|e| ConfigError::Invalid {
            agency: cfg.agency.clone(),
            reason: e.to_string(),
        })?;
        self.cache.write().expect("config cache lock poisoned").insert(cfg.agency.clone(), cfg.clone());
        Ok(())
    }
}

#[async_trait]
impl ConfigStore for TomlConfigStore {
    async fn load(&self, agency: &str) -> Result<AgencyStorageConfig, ConfigError> {
        if let Some(cached) = self.cache.read().expect("config cache lock poisoned").get(agency) {
            return Ok(cached.clone());
        }
        let cfg = self.read_from_disk(agency).await?;
        self.cache.write().expect("config cache lock poisoned").insert(agency.to_string(), cfg.clone());
        Ok(cfg)
    }

    async fn reload(&self, agency: &str) {
        debug!(%agency, "dropping cached agency config, next load re-reads from disk");
        self.cache.write().expect("config cache lock poisoned").remove(agency);
    }
}
