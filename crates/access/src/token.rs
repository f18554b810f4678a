use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque credential for time-bound access to a single path.
///
/// The bytes are meaningful only to the [`AccessProvider`](crate::AccessProvider)
/// that minted them. Tokens are never mutated; callers persist them with
/// [`as_bytes()`](Self::as_bytes) (or serde) and hand them back later via
/// [`from_bytes()`](Self::from_bytes).
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionToken(Vec<u8>);

impl PermissionToken {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Token contents may embed paths; keep them out of logs.
impl fmt::Debug for PermissionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PermissionToken(<{} bytes>)", self.0.len())
    }
}
