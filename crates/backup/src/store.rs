use crate::error::{ErrorKind, Result};
use crate::{BackupRecord, backup_name};
use exn::ResultExt;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::instrument;

/// Give up on finding a free name after this many collisions. Hitting it
/// means something else is writing into our private directory.
const MAX_NAME_ATTEMPTS: u32 = 100;
const COPY_CHUNK: usize = 64 * 1024;
/// Copies in progress live under `.backup-*.partial`, never a backup name.
const STAGING_PREFIX: &str = ".backup-";
const STAGING_SUFFIX: &str = ".partial";

/// Writes backups into a single application-private directory.
///
/// # Examples
///
/// ```no_run
/// use safehold_backup::BackupStore;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = BackupStore::new("/home/user/.local/share/safehold/backups")?;
/// let record = store.backup(Path::new("/home/user/notes.txt")).await?;
/// println!("backed up to {}", record.stored_path.display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BackupStore {
    root: PathBuf,
}

impl BackupStore {
    /// Create a store writing into `root`.
    ///
    /// The directory is not touched until the first backup.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidDirectory`](ErrorKind::InvalidDirectory) if `root` is
    /// not absolute.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidDirectory(root));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Copy `source` into the store, byte for byte.
    ///
    /// Files are copied to `<stem>_Backup_<timestamp>.<ext>`. Directories are
    /// copied to a `<name>_Backup_<timestamp>` directory holding copies of
    /// every regular file directly inside `source` (sub-directories are not
    /// descended into). The copy is staged under a temporary name and only
    /// moved to its backup name once complete and flushed to disk, so an
    /// interrupted backup never leaves a partial copy behind.
    ///
    /// # Errors
    ///
    /// One variant per phase: [`CreateDir`](ErrorKind::CreateDir),
    /// [`Read`](ErrorKind::Read) or [`Write`](ErrorKind::Write), each
    /// carrying the underlying I/O error as a child.
    #[instrument(skip(self), fields(store = %self.root.display()))]
    pub async fn backup(&self, source: &Path) -> Result<BackupRecord> {
        let source_name = match source.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => exn::bail!(ErrorKind::InvalidSource(source.to_path_buf())),
        };
        fs::create_dir_all(&self.root).await.or_raise(|| ErrorKind::CreateDir(self.root.clone()))?;
        let metadata = fs::metadata(source).await.or_raise(|| ErrorKind::Read(source.to_path_buf()))?;
        let created_at = OffsetDateTime::now_utc();

        let (stored_path, bytes) = if metadata.is_dir() {
            self.backup_dir(source, created_at).await?
        } else {
            self.backup_file(source, created_at).await?
        };
        tracing::info!(source = %source.display(), backup = %stored_path.display(), bytes, "Backup written");
        Ok(BackupRecord {
            source_name,
            created_at,
            stored_path,
            bytes,
        })
    }

    /// Copy `source` into a staging file, then move it to the first free
    /// backup name. Nothing appears under a backup name until the copy is
    /// complete and synced.
    async fn backup_file(&self, source: &Path, at: OffsetDateTime) -> Result<(PathBuf, u64)> {
        let staging_err = || ErrorKind::Write(self.root.clone());
        let mut staged = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .suffix(STAGING_SUFFIX)
            .tempfile_in(&self.root)
            .or_raise(staging_err)?;
        let file = staged.as_file().try_clone().or_raise(staging_err)?;
        let bytes = copy_into(source, fs::File::from_std(file), staged.path()).await?;

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let target = self.candidate(source, at, attempt)?;
            match staged.persist_noclobber(&target) {
                Ok(_) => return Ok((target, bytes)),
                Err(e) if e.error.kind() == IoErrorKind::AlreadyExists => staged = e.file,
                Err(e) => return Err(e.error).or_raise(|| ErrorKind::Write(target)),
            }
        }
        exn::bail!(ErrorKind::Write(self.candidate(source, at, MAX_NAME_ATTEMPTS)?))
    }

    /// Same as [`backup_file()`](Self::backup_file), for a folder's immediate
    /// regular files.
    async fn backup_dir(&self, source: &Path, at: OffsetDateTime) -> Result<(PathBuf, u64)> {
        let mut staged = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .suffix(STAGING_SUFFIX)
            .tempdir_in(&self.root)
            .or_raise(|| ErrorKind::CreateDir(self.root.clone()))?;

        let read_err = || ErrorKind::Read(source.to_path_buf());
        let mut entries = fs::read_dir(source).await.or_raise(read_err)?;
        let mut bytes = 0;
        while let Some(entry) = entries.next_entry().await.or_raise(read_err)? {
            let path = entry.path();
            // Follows symlinks, matching what the folder processor will read.
            let metadata = fs::metadata(&path).await.or_raise(|| ErrorKind::Read(path.clone()))?;
            if !metadata.is_file() {
                continue;
            }
            let copy = staged.path().join(entry.file_name());
            let file = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&copy)
                .await
                .or_raise(|| ErrorKind::Write(copy.clone()))?;
            bytes += copy_into(&path, file, &copy).await?;
        }

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let target = self.candidate(source, at, attempt)?;
            // Renaming a directory replaces an empty one at the target.
            if fs::try_exists(&target).await.or_raise(|| ErrorKind::Write(target.clone()))? {
                continue;
            }
            fs::rename(staged.path(), &target).await.or_raise(|| ErrorKind::Write(target.clone()))?;
            staged.disable_cleanup(true);
            return Ok((target, bytes));
        }
        exn::bail!(ErrorKind::CreateDir(self.candidate(source, at, MAX_NAME_ATTEMPTS)?))
    }

    fn candidate(&self, source: &Path, at: OffsetDateTime, attempt: u32) -> Result<PathBuf> {
        match backup_name(source, at, attempt) {
            Some(name) => Ok(self.root.join(name)),
            None => exn::bail!(ErrorKind::InvalidSource(source.to_path_buf())),
        }
    }
}

/// Copy `source` into `dest` one chunk at a time, then sync. Dropping the
/// future stops reading after the chunk in flight.
async fn copy_into(source: &Path, mut dest: fs::File, dest_path: &Path) -> Result<u64> {
    let read_err = || ErrorKind::Read(source.to_path_buf());
    let write_err = || ErrorKind::Write(dest_path.to_path_buf());
    let mut reader = fs::File::open(source).await.or_raise(read_err)?;
    let mut buffer = vec![0; COPY_CHUNK];
    let mut bytes = 0;
    loop {
        let read = reader.read(&mut buffer).await.or_raise(read_err)?;
        if read == 0 {
            break;
        }
        dest.write_all(&buffer[..read]).await.or_raise(write_err)?;
        bytes += read as u64;
    }
    dest.flush().await.or_raise(write_err)?;
    dest.sync_all().await.or_raise(write_err)?;
    Ok(bytes)
}
