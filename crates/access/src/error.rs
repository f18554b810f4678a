//! Access Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An access error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for access operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The platform refused to mint a token for this path (missing, or
    /// outside every permitted root). Ask the user to pick something else.
    #[display("cannot create permission token for {}", _0.display())]
    TokenCreation(#[error(not(source))] PathBuf),
    /// The token bytes are corrupt, tampered with, or from another provider.
    /// Discard the token and ask the user to select the path again.
    #[display("cannot resolve permission token: {_0}")]
    TokenResolution(#[error(not(source))] String),
    /// The token resolved, but the time-bound grant was refused.
    #[display("access denied: {}", _0.display())]
    AccessDenied(#[error(not(source))] PathBuf),
    /// A configured permitted root is unusable (relative, or missing).
    #[display("invalid permitted root: {}", _0.display())]
    InvalidRoot(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
