//! Error types for devdir-sync.

use thiserror::Error;

use devdir_core::error::ConfigError;

use crate::provider::ProviderError;

/// All errors that abort a reconciliation run.
///
/// Per-issue write failures do NOT appear here — those are collected as
/// [`crate::pipeline::RunFailure`] values on the run summary and the run
/// continues.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A remote read the run cannot proceed without (issue/repo listing).
    #[error("remote read failed: {0}")]
    Read(#[from] ProviderError),

    /// Configuration was invalid at run time.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Snapshot serialization error.
    #[error("snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
