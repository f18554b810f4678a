//! Allow-list access provider for platforms without a native grant API.
//!
//! Tokens are only minted for existing paths inside one of the configured
//! permitted roots. The token is a JSON payload describing the target as it
//! was at selection time, sealed with a BLAKE3 checksum so that corrupted or
//! hand-edited tokens fail resolution instead of silently pointing elsewhere.

use crate::error::{ErrorKind, Result};
use crate::{AccessProvider, PermissionToken, Resolution};
use exn::ResultExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use time::OffsetDateTime;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
struct Payload {
    path: PathBuf,
    size: u64,
    /// Unix timestamp (nanoseconds) of the last modification.
    modified: i128,
    /// Unix timestamp (seconds) the token was minted.
    issued: i64,
}
impl Payload {
    fn checksum(&self) -> Result<String> {
        let bytes = serde_json::to_vec(self)
            .or_raise(|| ErrorKind::TokenResolution("payload is not serializable".to_string()))?;
        Ok(blake3::hash(&bytes).to_hex().to_string())
    }

    /// Whether the file on disk still looks like the one the user picked.
    fn matches(&self, metadata: &Metadata) -> bool {
        metadata.len() == self.size && modified_nanos(metadata) == Some(self.modified)
    }
}

#[derive(Serialize, Deserialize)]
struct Sealed {
    payload: Payload,
    checksum: String,
}

fn modified_nanos(metadata: &Metadata) -> Option<i128> {
    let modified = metadata.modified().ok()?;
    Some(OffsetDateTime::from(modified).unix_timestamp_nanos())
}

/// Access provider backed by a list of permitted root directories.
///
/// # Examples
///
/// ```no_run
/// use safehold_access::provider::LocalAccessProvider;
/// use safehold_access::AccessProvider;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = LocalAccessProvider::new(["/home/user/Documents"])?;
/// let token = provider.create_token(Path::new("/home/user/Documents/notes.txt"))?;
/// let resolution = provider.resolve(&token)?;
/// assert!(!resolution.stale);
/// # Ok(())
/// # }
/// ```
pub struct LocalAccessProvider {
    roots: Vec<PathBuf>,
    outstanding: AtomicUsize,
}

impl LocalAccessProvider {
    /// Create a provider permitting access beneath each of `roots`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRoot`](ErrorKind::InvalidRoot) if a root is relative
    /// or does not exist.
    pub fn new(roots: impl IntoIterator<Item = impl AsRef<Path>>) -> Result<Self> {
        let mut canonical = Vec::new();
        for root in roots {
            let root = root.as_ref();
            if !root.is_absolute() {
                exn::bail!(ErrorKind::InvalidRoot(root.to_path_buf()));
            }
            // Canonicalize so that symlinked roots (macOS `/var` -> `/private/var`)
            // compare equal to canonicalized selections.
            canonical.push(fs::canonicalize(root).or_raise(|| ErrorKind::InvalidRoot(root.to_path_buf()))?);
        }
        Ok(Self {
            roots: canonical,
            outstanding: AtomicUsize::new(0),
        })
    }

    /// Number of grants that have begun but not yet ended.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    fn is_permitted(&self, canonical: &Path) -> bool {
        self.roots.iter().any(|root| canonical.starts_with(root))
    }

    fn decode(token: &PermissionToken) -> Result<Payload> {
        let sealed: Sealed = serde_json::from_slice(token.as_bytes())
            .or_raise(|| ErrorKind::TokenResolution("malformed token".to_string()))?;
        if sealed.payload.checksum()? != sealed.checksum {
            exn::bail!(ErrorKind::TokenResolution("checksum mismatch".to_string()));
        }
        Ok(sealed.payload)
    }
}

impl AccessProvider for LocalAccessProvider {
    fn name(&self) -> &str {
        "local"
    }

    fn create_token(&self, path: &Path) -> Result<PermissionToken> {
        let denied = || ErrorKind::TokenCreation(path.to_path_buf());
        let canonical = fs::canonicalize(path).or_raise(denied)?;
        if !self.is_permitted(&canonical) {
            tracing::info!(path = %canonical.display(), "Refusing token for path outside permitted roots");
            exn::bail!(denied());
        }
        let metadata = fs::metadata(&canonical).or_raise(denied)?;
        let payload = Payload {
            size: metadata.len(),
            modified: modified_nanos(&metadata).unwrap_or_default(),
            issued: OffsetDateTime::now_utc().unix_timestamp(),
            path: canonical,
        };
        let checksum = payload.checksum().or_raise(denied)?;
        let bytes = serde_json::to_vec(&Sealed { payload, checksum }).or_raise(denied)?;
        Ok(PermissionToken::from_bytes(bytes))
    }

    fn resolve(&self, token: &PermissionToken) -> Result<Resolution> {
        let payload = Self::decode(token)?;
        // A target we can no longer inspect is reported stale rather than
        // failing resolution; whether access is still possible is decided by
        // begin_access().
        let stale = match fs::metadata(&payload.path) {
            Ok(metadata) => !payload.matches(&metadata),
            Err(_) => true,
        };
        Ok(Resolution { path: payload.path, stale })
    }

    fn begin_access(&self, path: &Path) -> Result<()> {
        let denied = || ErrorKind::AccessDenied(path.to_path_buf());
        let canonical = fs::canonicalize(path).or_raise(denied)?;
        if !self.is_permitted(&canonical) {
            exn::bail!(denied());
        }
        fs::metadata(&canonical).or_raise(denied)?;
        let outstanding = self.outstanding.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(path = %canonical.display(), outstanding, "Access granted");
        Ok(())
    }

    fn end_access(&self, path: &Path) {
        let previous = self.outstanding.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(previous > 0, "end_access without matching begin_access");
        tracing::debug!(path = %path.display(), outstanding = previous.saturating_sub(1), "Access released");
    }
}
