//! Permission tokens and scoped access grants.
//!
//! A [`PermissionToken`] is an opaque, persistable credential minted by an
//! [`AccessProvider`] when the user selects a path. Redeeming it with
//! [`ScopedAccessGuard::acquire`] yields a guard that keeps the grant alive
//! until it is dropped; there is no other way to end a grant.

pub mod error;
mod guard;
pub mod provider;
mod token;

pub use crate::guard::ScopedAccessGuard;
pub use crate::provider::{AccessProvider, Resolution};
pub use crate::token::PermissionToken;
use std::sync::Arc;

pub type AccessHandle = Arc<dyn AccessProvider + Send + Sync>;
