//! Backup Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. The underlying `std::io::Error` is
//! kept as a child frame; the variant tells you which phase failed.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A backup error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for backup operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories, one per backup phase.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The backup directory could not be created.
    #[display("cannot create backup directory {}", _0.display())]
    CreateDir(#[error(not(source))] PathBuf),
    /// The original content could not be read.
    #[display("cannot read original {}", _0.display())]
    Read(#[error(not(source))] PathBuf),
    /// The copy could not be written.
    #[display("cannot write backup {}", _0.display())]
    Write(#[error(not(source))] PathBuf),
    /// The backup directory must be an absolute path.
    #[display("invalid backup directory: {}", _0.display())]
    InvalidDirectory(#[error(not(source))] PathBuf),
    /// The source has no usable file name to derive a backup name from.
    #[display("cannot derive a backup name from {}", _0.display())]
    InvalidSource(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::CreateDir(_) | Self::Read(_) | Self::Write(_))
    }
}
