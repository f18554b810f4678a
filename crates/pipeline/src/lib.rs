//! Background pipeline runs.
//!
//! A run takes one user selection through
//! `acquire → back up → process → release`:
//!
//! 1. the [`PermissionToken`](safehold_access::PermissionToken) is redeemed
//!    for a [`ScopedAccessGuard`](safehold_access::ScopedAccessGuard);
//! 2. the [`BackupStore`](safehold_backup::BackupStore) copies the original;
//! 3. the strategy registered for the run's
//!    [`FileCategory`](safehold_process::FileCategory) transforms it;
//! 4. the guard is dropped, and only then is the terminal update sent.
//!
//! Progress and [`LogEvent`]s flow from the run to a single [`Observer`]
//! over an order-preserving channel; the observer (typically a [`RunView`])
//! is the only thing that ever holds the state a UI would display.

pub mod error;
mod event;
mod handle;
mod orchestrator;
mod view;

pub use crate::event::{LogEvent, RunState, RunUpdate, Severity};
pub use crate::handle::{RunHandle, RunOutcome};
pub use crate::orchestrator::PipelineOrchestrator;
pub use crate::view::{Observer, RunView};
