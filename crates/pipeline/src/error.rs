//! Pipeline Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use safehold_process::FileCategory;
use std::path::PathBuf;

/// A pipeline error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// Variants raised inside a run carry the human-readable cause of the
/// underlying failure, so the terminal event can say what went wrong without
/// walking the error tree.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// No token could be minted for the selection.
    #[display("cannot create permission token for {}", _0.display())]
    TokenCreation(#[error(not(source))] PathBuf),
    /// The token could not be redeemed, or the grant was refused.
    #[display("access failed: {reason}")]
    Access { reason: String },
    /// The backup copy could not be written; nothing was processed.
    #[display("backup failed: {reason}")]
    Backup { reason: String },
    /// The strategy for `category` failed (after the backup was taken).
    #[display("{category} processing failed: {reason}")]
    Processing { category: FileCategory, reason: String },
    /// The run was cancelled by its caller.
    #[display("cancelled")]
    Cancelled,
    /// Another run is still active on this orchestrator. Wait for it to
    /// finish (or cancel it) and try again.
    #[display("a run is already in progress")]
    Busy,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy)
    }
}
