//! Access provider trait and implementations.
//!
//! An [`AccessProvider`] is the seam between the pipeline and whatever the
//! platform uses to hand out scoped access (security-scoped bookmarks,
//! portal grants, a plain allow-list of directories...). The pipeline only
//! ever talks to providers through a [`ScopedAccessGuard`](crate::ScopedAccessGuard).

mod local;
#[cfg(any(test, feature = "mock"))]
mod mock;

pub use self::local::LocalAccessProvider;
#[cfg(any(test, feature = "mock"))]
pub use self::mock::{AccessCall, MockAccessProvider};
use crate::PermissionToken;
use crate::error::Result;
use std::path::{Path, PathBuf};

/// The outcome of redeeming a [`PermissionToken`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Concrete path the token grants access to.
    pub path: PathBuf,
    /// The target changed since the token was minted. Stale tokens are still
    /// usable, but callers must surface a warning.
    pub stale: bool,
}

/// Platform interface for minting and redeeming permission tokens.
///
/// `begin_access` and `end_access` are always paired by
/// [`ScopedAccessGuard`](crate::ScopedAccessGuard); implementations may
/// assume `end_access` is never called without a preceding successful
/// `begin_access` for the same path.
pub trait AccessProvider: Send + Sync {
    /// Name of the provider (for logging only).
    fn name(&self) -> &str;

    /// Mint a token for a user-approved selection.
    ///
    /// Returns [`TokenCreation`](crate::error::ErrorKind::TokenCreation) if
    /// the platform will not vouch for this path.
    fn create_token(&self, path: &Path) -> Result<PermissionToken>;

    /// Resolve a token back to its path, reporting staleness.
    ///
    /// Returns [`TokenResolution`](crate::error::ErrorKind::TokenResolution)
    /// for malformed tokens.
    fn resolve(&self, token: &PermissionToken) -> Result<Resolution>;

    /// Start the time-bound grant for a resolved path.
    ///
    /// Returns [`AccessDenied`](crate::error::ErrorKind::AccessDenied) if the
    /// grant is refused; nothing needs releasing in that case.
    fn begin_access(&self, path: &Path) -> Result<()>;

    /// End a grant previously started with [`begin_access`](Self::begin_access).
    fn end_access(&self, path: &Path);
}
