use crate::error::{ErrorKind, Result};
use crate::{AccessHandle, PermissionToken, Resolution};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::instrument;

/// A live, time-bound access grant.
///
/// The grant begins in [`acquire()`](Self::acquire) and ends exactly once,
/// when the guard is dropped. Early returns, `?`, panics and dropped futures
/// all release it; there is no separate "stop" call to forget or to repeat.
///
/// The guard is deliberately neither `Clone` nor shareable: whoever acquired
/// it owns the resolved path for as long as the grant lasts.
#[must_use = "access is released as soon as the guard is dropped"]
pub struct ScopedAccessGuard {
    provider: AccessHandle,
    path: PathBuf,
    stale: bool,
}

impl ScopedAccessGuard {
    /// Redeem `token` and begin access to the path it resolves to.
    ///
    /// # Errors
    ///
    /// - [`TokenResolution`](ErrorKind::TokenResolution) if the token is malformed.
    /// - [`AccessDenied`](ErrorKind::AccessDenied) if the grant is refused, or
    ///   if the target vanished between resolution and the grant. In the
    ///   latter case the grant was already claimed and is released before
    ///   this function returns.
    #[instrument(skip_all, fields(provider = provider.name()))]
    pub fn acquire(provider: &AccessHandle, token: &PermissionToken) -> Result<Self> {
        let Resolution { path, stale } = provider.resolve(token)?;
        if stale {
            tracing::warn!(path = %path.display(), "Permission token is stale; continuing with best effort");
        }
        provider.begin_access(&path)?;
        // From here on the grant is claimed; any failure drops the guard.
        let guard = Self {
            provider: Arc::clone(provider),
            path,
            stale,
        };
        if !guard.path.try_exists().unwrap_or(false) {
            exn::bail!(ErrorKind::AccessDenied(guard.path.clone()));
        }
        tracing::debug!(path = %guard.path.display(), "Scoped access acquired");
        Ok(guard)
    }

    /// The path this guard grants access to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the token was reported stale during resolution.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// End the grant now rather than at the end of the enclosing scope.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for ScopedAccessGuard {
    fn drop(&mut self) {
        self.provider.end_access(&self.path);
        tracing::debug!(path = %self.path.display(), "Scoped access released");
    }
}

impl std::fmt::Debug for ScopedAccessGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedAccessGuard")
            .field("provider", &self.provider.name())
            .field("path", &self.path)
            .field("stale", &self.stale)
            .finish()
    }
}
