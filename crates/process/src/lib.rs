//! Per-category file processing.
//!
//! A [`Processor`] turns the file (or folder) at a path into a new artifact
//! and returns where it put it. Single-file strategies never touch their
//! input: they write a `processed_`-prefixed sibling, atomically, so a crash
//! mid-write can't leave a half-written file under the final name.
//!
//! The [`ProcessorRegistry`] maps each [`FileCategory`] to a strategy, so the
//! pipeline never needs to know which concrete strategy it is running.

mod atomic;
mod category;
pub mod error;
mod registry;
pub mod strategy;

pub use crate::atomic::write_atomic;
pub use crate::category::FileCategory;
pub use crate::registry::ProcessorRegistry;
use crate::error::{ErrorKind, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File name prefix for every single-file strategy's output.
pub const OUTPUT_PREFIX: &str = "processed_";

pub type ProcessorHandle = Arc<dyn Processor + Send + Sync>;

/// A processing strategy.
///
/// Implementations are synchronous and may block; callers running inside an
/// async runtime should move them onto a blocking thread.
pub trait Processor: Send + Sync {
    /// Short name of the strategy (for logging only).
    fn name(&self) -> &str;

    /// Process the file or folder at `path`, returning the path of the result.
    fn process(&self, path: &Path) -> Result<PathBuf>;
}

/// Sibling output path for `path`: same directory, `processed_` prefix.
///
/// # Examples
///
/// ```
/// use safehold_process::output_path;
/// use std::path::Path;
///
/// assert_eq!(
///     output_path(Path::new("/docs/notes.txt")).unwrap(),
///     Path::new("/docs/processed_notes.txt")
/// );
/// ```
pub fn output_path(path: &Path) -> Result<PathBuf> {
    let Some(name) = path.file_name() else {
        exn::bail!(ErrorKind::InvalidPath(path.to_path_buf()));
    };
    let mut output = std::ffi::OsString::from(OUTPUT_PREFIX);
    output.push(name);
    Ok(path.with_file_name(output))
}
