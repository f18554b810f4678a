//! In-memory access provider for testing.

use crate::error::{ErrorKind, Result};
use crate::{AccessProvider, PermissionToken, Resolution};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A call made against a [`MockAccessProvider`], in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessCall {
    Begin(PathBuf),
    End(PathBuf),
}

#[derive(Default)]
struct MockState {
    deny: bool,
    stale: bool,
    unresolvable: bool,
    calls: Vec<AccessCall>,
}

/// In-memory access provider for testing.
///
/// Tokens are simply the UTF-8 bytes of the selected path, so any path is
/// accepted. Every [`begin_access`](AccessProvider::begin_access) and
/// [`end_access`](AccessProvider::end_access) is recorded so tests can
/// assert on acquire/release pairing.
///
/// # Examples
///
/// ```
/// use safehold_access::provider::MockAccessProvider;
/// use safehold_access::AccessProvider;
/// use std::path::Path;
///
/// let provider = MockAccessProvider::new().with_stale_tokens();
/// let token = provider.create_token(Path::new("/data/notes.txt")).unwrap();
/// assert!(provider.resolve(&token).unwrap().stale);
/// ```
#[derive(Default)]
pub struct MockAccessProvider {
    state: Mutex<MockState>,
}

impl MockAccessProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse every grant with [`AccessDenied`](ErrorKind::AccessDenied).
    pub fn with_denied_access(self) -> Self {
        self.state().deny = true;
        self
    }

    /// Report every resolved token as stale.
    pub fn with_stale_tokens(self) -> Self {
        self.state().stale = true;
        self
    }

    /// Fail every resolution with [`TokenResolution`](ErrorKind::TokenResolution).
    pub fn with_unresolvable_tokens(self) -> Self {
        self.state().unresolvable = true;
        self
    }

    /// All begin/end calls made so far.
    pub fn calls(&self) -> Vec<AccessCall> {
        self.state().calls.clone()
    }

    pub fn begins(&self) -> usize {
        self.state().calls.iter().filter(|c| matches!(c, AccessCall::Begin(_))).count()
    }

    pub fn ends(&self) -> usize {
        self.state().calls.iter().filter(|c| matches!(c, AccessCall::End(_))).count()
    }

    /// Grants currently held (begins minus ends).
    pub fn active(&self) -> usize {
        self.begins().saturating_sub(self.ends())
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread shouldn't hide the calls made before it.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AccessProvider for MockAccessProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn create_token(&self, path: &Path) -> Result<PermissionToken> {
        match path.to_str() {
            Some(s) => Ok(PermissionToken::from_bytes(s.as_bytes())),
            None => exn::bail!(ErrorKind::TokenCreation(path.to_path_buf())),
        }
    }

    fn resolve(&self, token: &PermissionToken) -> Result<Resolution> {
        let state = self.state();
        if state.unresolvable {
            exn::bail!(ErrorKind::TokenResolution("mock provider refuses to resolve".to_string()));
        }
        match std::str::from_utf8(token.as_bytes()) {
            Ok(path) if !path.is_empty() => Ok(Resolution {
                path: PathBuf::from(path),
                stale: state.stale,
            }),
            _ => exn::bail!(ErrorKind::TokenResolution("malformed token".to_string())),
        }
    }

    fn begin_access(&self, path: &Path) -> Result<()> {
        let mut state = self.state();
        if state.deny {
            exn::bail!(ErrorKind::AccessDenied(path.to_path_buf()));
        }
        state.calls.push(AccessCall::Begin(path.to_path_buf()));
        Ok(())
    }

    fn end_access(&self, path: &Path) {
        self.state().calls.push(AccessCall::End(path.to_path_buf()));
    }
}
