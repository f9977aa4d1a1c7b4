//! # CLI Argument Definitions
//!
//! Defines the command-line interface for `lade` using `clap` derive macros.
//!
//! This module contains pure data definitions for CLI parsing -- no business
//! logic. The [`Cli`] struct is the top-level parser, and [`Commands`]
//! enumerates the available subcommands.
//!
//! ## Commands
//!
//! | Command       | Description                                          |
//! |----------------|------------------------------------------------------|
//! | `run-worker`  | Start the job-runner worker pool                     |
//! | `trigger`     | Fire the write-hook for one lease and await the job   |
//! | `config show` | Print an agency's resolved storage configuration      |

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI entry point for `lade`.
///
/// `lade` drives the Lease Archive Discovery Engine: resolving, creating,
/// and link-exposing per-lease archive directories in a workspace-aware
/// cloud storage provider.
#[derive(Debug, Parser)]
#[command(
    name = "lade",
    about = "Lease Archive Discovery Engine",
    long_about = "lade discovers, materializes, and link-exposes per-lease \
                  archive directories in a hierarchical cloud storage \
                  provider, driven by deduplicated, retriable background \
                  jobs.",
    version,
    propagate_version = true
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the job-runner worker pool against a local data directory.
    RunWorker(RunWorkerArgs),

    /// Fire the write-hook for one lease and wait for the resulting job.
    Trigger(TriggerArgs),

    /// Inspect agency storage configuration.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Debug, clap::Args)]
pub struct RunWorkerArgs {
    /// Root directory for agency config, lease, and cloud-location files.
    #[arg(long, default_value = "./data")]
    pub data_dir: PathBuf,

    /// Number of concurrent worker tasks draining the job queue.
    #[arg(long, default_value_t = 4)]
    pub workers: usize,

    /// Dropbox bearer token. Required unless `--fake-cloud` is set.
    #[arg(long, env = "LADE_DROPBOX_TOKEN")]
    pub dropbox_token: Option<String>,

    /// Use an in-memory fake cloud port instead of the real Dropbox API,
    /// for local demonstration without provider credentials.
    #[arg(long, default_value_t = false)]
    pub fake_cloud: bool,
}

#[derive(Debug, clap::Args)]
pub struct TriggerArgs {
    /// Root directory for agency config, lease, and cloud-location files.
    #[arg(long, default_value = "./data")]
    pub data_dir: PathBuf,

    /// Agency the lease belongs to.
    #[arg(long)]
    pub agency: String,

    /// Lease number to run discovery for.
    #[arg(long)]
    pub lease: String,

    /// User identity to attribute the triggering write to. Omitting this
    /// reproduces the "no user in context" quiet-skip behavior.
    #[arg(long)]
    pub user: Option<String>,

    /// Use an in-memory fake cloud port instead of the real Dropbox API.
    #[arg(long, default_value_t = false)]
    pub fake_cloud: bool,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the resolved `AgencyStorageConfig` for one agency.
    Show {
        /// Root directory holding `agencies/{agency}.toml`.
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,

        /// Agency to print configuration for.
        agency: String,
    },
}
