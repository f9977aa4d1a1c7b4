//! Error types for LADE.
//!
//! This module defines all error types used throughout the archive-discovery
//! pipeline. All errors derive from `thiserror::Error` and carry enough
//! context to distinguish retryable failures from terminal ones without the
//! caller having to pattern-match on string contents.

// Layer 1: Standard library imports
use std::io;

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports (none - this is a root module)

/// Top-level error type for LADE.
///
/// Wraps all domain-specific errors so call sites that cross module
/// boundaries (e.g. the job runner invoking a workflow) have a single type
/// to propagate with `?`.
///
/// # Examples
///
/// ```rust
/// use lade_core::error::{LadeError, ConfigError};
///
/// fn example() -> Result<(), LadeError> {
///     Err(ConfigError::Disabled { agency: "acme".into() })?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Error)]
pub enum LadeError {
    /// Cloud storage provider errors.
    #[error("cloud error: {0}")]
    Cloud(#[from] CloudError),

    /// Agency configuration errors.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Local persistence errors.
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Workflow orchestration errors.
    #[error("workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    /// Job scheduling and execution errors.
    #[error("job error: {0}")]
    Job(#[from] JobError),

    /// I/O errors.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Errors raised by a [`crate::traits::CloudPort`] implementation.
///
/// The retryable/non-retryable split mirrors the error taxonomy every
/// caller in the pipeline is expected to consult via [`CloudError::is_retryable`]
/// rather than retrying blindly on any `Err`.
#[derive(Debug, Error)]
pub enum CloudError {
    /// Transient failure: network blip, 5xx response, rate limiting without
    /// a `Retry-After` the caller can honor directly.
    #[error("transient cloud failure: {0}")]
    Transient(String),

    /// Authentication/authorization failure. Retried once after a token
    /// refresh; a second failure is treated as terminal by the caller.
    #[error("cloud authentication failure: {0}")]
    Auth(String),

    /// The requested path does not exist at the provider.
    #[error("path not found: {0}")]
    NotFound(String),

    /// Provider-side rate limit was hit; callers should back off.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Underlying HTTP transport error.
    #[error("http transport error: {0}")]
    Http(String),
}

impl CloudError {
    /// Whether this error represents a condition worth retrying.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transient(_) | Self::Auth(_) | Self::RateLimited { .. } | Self::Http(_)
        )
    }
}

/// Errors raised loading or validating per-agency storage configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The agency's storage integration is explicitly disabled.
    #[error("storage config disabled for agency {agency}")]
    Disabled { agency: String },

    /// No storage configuration exists for the agency at all.
    #[error("no storage config found for agency {agency}")]
    Missing { agency: String },

    /// Configuration exists but failed to parse or validate.
    #[error("invalid storage config for agency {agency}: {reason}")]
    Invalid { agency: String, reason: String },
}

impl ConfigError {
    /// Configuration errors are never retryable: retrying without an
    /// operator fixing the configuration would just fail again.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        false
    }
}

/// Errors raised by lease/cloud-location persistence.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The requested record does not exist.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Underlying storage failed to read or write.
    #[error("storage failure: {0}")]
    Storage(String),

    /// Stored data failed to (de)serialize.
    #[error("serialization failure: {0}")]
    Serialization(String),
}

/// Errors raised while running a discovery workflow.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The agency's configured base path does not exist at the provider.
    #[error("base path missing: {0}")]
    BasePathMissing(String),

    /// Directory creation failed after the base path was confirmed to exist.
    #[error("directory creation failed: {0}")]
    DirectoryCreationFailed(String),

    /// A local programming invariant was violated. Never retried, never
    /// silently swallowed: this indicates a bug, not an expected failure mode.
    #[error("programming error: {0}")]
    LocalProgrammingError(String),

    /// Propagated configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Propagated cloud error.
    #[error(transparent)]
    Cloud(#[from] CloudError),

    /// Propagated persistence error.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl WorkflowError {
    /// Whether the job runner should treat this as worth a retry attempt.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::DirectoryCreationFailed(_) => true,
            Self::BasePathMissing(_) | Self::LocalProgrammingError(_) => false,
            Self::Config(e) => e.is_retryable(),
            Self::Cloud(e) => e.is_retryable(),
            Self::Persistence(_) => true,
        }
    }
}

/// Errors surfaced by the job runner itself, as distinct from the workflow
/// it executes.
#[derive(Debug, Error)]
pub enum JobError {
    /// The wrapped workflow failed in a way that can be retried.
    #[error("retryable failure: {0}")]
    Retryable(#[from] WorkflowError),

    /// The job failed in a way retries cannot fix; recorded and not
    /// requeued.
    #[error("terminal failure: {0}")]
    Terminal(String),

    /// The job exceeded its hard execution timeout.
    #[error("job timed out")]
    TimedOut,
}

impl JobError {
    /// Whether the job runner should requeue this job for another attempt.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Retryable(e) => e.is_retryable(),
            Self::Terminal(_) => false,
            Self::TimedOut => true,
        }
    }
}
