use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::fs::File;
use std::io;
use std::path::Path;

/// Write `target` atomically.
///
/// `write` fills a temporary file created next to `target`; only once it has
/// returned successfully and the data is synced is the temporary file renamed
/// onto `target`. If `write` fails (or panics) the temporary file is removed
/// and `target` is left exactly as it was: absent, or holding its previous
/// complete contents.
pub fn write_atomic<F>(target: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let write_err = || ErrorKind::Write(target.to_path_buf());
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    // Same directory as the target, so the final rename never crosses filesystems.
    let mut tmp = tempfile::Builder::new()
        .prefix(".safehold-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .or_raise(write_err)?;
    write(tmp.as_file_mut()).or_raise(write_err)?;
    tmp.as_file().sync_all().or_raise(write_err)?;
    tmp.persist(target).map_err(|e| e.error).or_raise(write_err)?;
    Ok(())
}
