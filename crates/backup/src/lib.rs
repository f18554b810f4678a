//! Backup-before-mutate copies.
//!
//! Before anything transforms a user's file, [`BackupStore::backup`] writes a
//! byte-identical copy into an application-private directory (created on
//! first use). Backups are named `<stem>_Backup_<timestamp>.<ext>` with a
//! path-safe, lexicographically sortable UTC timestamp, and are never
//! deleted by this crate; retention is somebody else's problem.

pub mod error;
mod name;
mod store;

pub use crate::name::backup_name;
pub use crate::store::BackupStore;
use std::path::PathBuf;
use time::OffsetDateTime;

/// A completed backup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRecord {
    /// File (or directory) name of the source at backup time.
    pub source_name: String,
    /// When the backup name was stamped.
    pub created_at: OffsetDateTime,
    /// Where the copy lives. A directory when the source was a directory.
    pub stored_path: PathBuf,
    /// Total bytes copied.
    pub bytes: u64,
}
