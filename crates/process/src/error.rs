//! Processing Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use crate::FileCategory;
use derive_more::{Display, Error};
use std::fmt;
use std::path::PathBuf;

/// A processing error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for processing operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a single member of a folder could not be processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberFailure {
    pub path: PathBuf,
    pub reason: String,
}
impl fmt::Display for MemberFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.path.file_name().unwrap_or(self.path.as_os_str());
        write!(f, "{} ({})", name.to_string_lossy(), self.reason)
    }
}

fn join(failures: &[MemberFailure]) -> String {
    failures.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The input could not be read.
    #[display("cannot read {}", _0.display())]
    Read(#[error(not(source))] PathBuf),
    /// The output could not be written (nothing was left at the final path).
    #[display("cannot write {}", _0.display())]
    Write(#[error(not(source))] PathBuf),
    /// The input is not what the strategy expects (wrong signature, not
    /// UTF-8...). Retrying with the same file won't help.
    #[display("{}: {reason}", path.display())]
    InvalidContent { path: PathBuf, reason: String },
    /// The path has no file name to derive an output name from.
    #[display("invalid path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    /// The category name is not one we know.
    #[display("unknown file category: {_0}")]
    UnknownCategory(#[error(not(source))] String),
    /// No strategy is registered for the category.
    #[display("no processor registered for {_0}")]
    Unregistered(#[error(not(source))] FileCategory),
    /// One or more members of a folder failed; the others were processed.
    #[display("{} of {total} files failed: {}", failures.len(), join(failures))]
    Aggregate { failures: Vec<MemberFailure>, total: usize },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Read(_) | Self::Write(_))
    }

    /// Members that failed, if this is an aggregate failure.
    pub fn failures(&self) -> &[MemberFailure] {
        match self {
            Self::Aggregate { failures, .. } => failures,
            _ => &[],
        }
    }
}
