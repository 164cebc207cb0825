//! Fatal error categories of an install run.
//!
//! These travel inside `anyhow::Error` chains, either as the root cause or as
//! context, so callers recover them with `downcast_ref`.

use thiserror::Error;

/// The source archive could not be obtained.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Failed to fetch {url}")]
pub struct FetchError {
    pub url: String,
}

/// The fetched archive does not hash to the declared digest.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("SHA-256 mismatch for {path}: expected {expected}, got {actual}")]
pub struct IntegrityError {
    pub path: String,
    pub expected: String,
    pub actual: String,
}

/// A file placement or text patch step failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Install step {index} ({step}) failed")]
pub struct InstallStepError {
    /// 1-based position in the descriptor's step list; 0 for the commit phase.
    pub index: usize,
    pub step: String,
}

/// Returns true if any error in the chain is of type `E`.
pub fn is_caused_by<E>(error: &anyhow::Error) -> bool
where
    E: std::error::Error + Send + Sync + 'static,
{
    error.downcast_ref::<E>().is_some() || error.chain().any(|cause| cause.is::<E>())
}
