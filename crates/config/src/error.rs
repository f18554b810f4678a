//! Configuration Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A configuration source could not be read or parsed; the figment error
    /// (with the offending key and source) is attached as a child.
    #[display("cannot load configuration")]
    Load,
    /// The configuration loaded, but a value is unusable.
    #[display("invalid configuration: {_0}")]
    Invalid(#[error(not(source))] String),
    /// No home directory could be found to derive default locations from.
    /// Set `backup_dir` explicitly.
    #[display("cannot determine the application data directory")]
    NoHomeDirectory,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
