//! # LADE Core
//!
//! Core domain types, trait abstractions, and errors for the Lease Archive
//! Discovery Engine.
//!
//! This crate contains **zero implementations** — only the data LADE passes
//! around ([`model`]) and the capability interfaces ([`traits`]) that
//! `lade-cloud`, `lade-persistence`, `lade-engine`, and `lade-jobs`
//! implement or consume. This enforces the dependency-inversion shape used
//! throughout the workspace.
//!
//! ## Module Structure
//!
//! - [`error`] — the error taxonomy (§7): cloud, config, persistence,
//!   workflow, and job errors, each able to report whether it is retryable.
//! - [`model`] — `Lease`, `AgencyStorageConfig`, `CloudLocation`,
//!   `WorkflowJob`, and their supporting types.
//! - [`traits`] — `CloudPort`, `ConfigStore`, `LeaseRepository`,
//!   `CloudLocationRepository`, `DedupStore`.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  lade-cloud   lade-persistence          │
//! │  lade-engine  lade-jobs   lade-cli      │
//! └─────────────────┬───────────────────────┘
//!                   │ depends on
//!                   ▼
//! ┌─────────────────────────────────────────┐
//! │              lade-core                  │
//! │     (traits, types, errors only)        │
//! └─────────────────────────────────────────┘
//! ```

pub mod error;
pub mod model;
pub mod traits;
