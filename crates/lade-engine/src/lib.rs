//! Archive discovery, creation, and report-detection workflows.
//!
//! This crate holds the orchestration logic that sits above `lade-cloud`'s
//! `CloudPort` and `lade-persistence`'s repository implementations:
//!
//! - [`finder`] — `ArchiveFinder`, a read-only search for a lease's archive
//!   directory.
//! - [`creator`] — `ArchiveCreator`, materializes the directory tree and
//!   share link when nothing was found.
//! - [`detector`] — `ReportDetector`, a pure query over an archive
//!   directory's contents.
//! - [`workflow`] — `DiscoveryWorkflow` and `FullDiscoveryWorkflow`, the two
//!   entry points `lade-jobs` calls into, composing the three above.
//!
//! Every function here is generic over the `lade-core` traits rather than
//! `dyn`-dispatched, so tests substitute `FakeCloudPort` and in-memory
//! repositories without a trait-object indirection in production code.

pub mod creator;
pub mod detector;
pub mod finder;
pub mod workflow;

pub use creator::{create_archive, ArchiveCreationResult};
pub use detector::{detect_report, ReportDetectionResult};
pub use finder::{find_archive, ArchiveSearchResult};
pub use workflow::{run_discovery, run_full_discovery, DiscoveryOutcome, FullDiscoveryOutcome};
