//! # Config Command Handler
//!
//! Handles the `lade config show` subcommand, a read-only window onto the
//! `TomlConfigStore` for operators verifying an agency's resolved storage
//! configuration (including documented defaults) without opening the TOML
//! file by hand.

// Layer 2: External crates
use anyhow::Context;

// Layer 3: Internal crates/modules
use lade_core::traits::ConfigStore;
use lade_persistence::config::TomlConfigStore;

use crate::cli::ConfigCommand;

/// Runs the `config` command group.
///
/// # Errors
///
/// Returns an error if the requested agency has no configuration on disk.
pub async fn run(command: ConfigCommand) -> anyhow::Result<()> {
    match command {
        ConfigCommand::Show { data_dir, agency } => {
            let store = TomlConfigStore::new(data_dir.join("config"));
            let cfg = store
                .load(&agency)
                .await
                .with_context(|| format!("no storage configuration found for agency {agency:?}"))?;
            let toml_text = toml::to_string_pretty(&cfg).context("failed to render configuration as TOML")?;
            print!("{toml_text}");
            Ok(())
        }
    }
}
