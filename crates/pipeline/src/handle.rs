use crate::{Observer, RunUpdate};
use async_stream::stream;
use futures::{Stream, StreamExt};
use safehold_backup::BackupRecord;
use std::path::{Path, PathBuf};
use std::pin::pin;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed {
        /// What the strategy produced (the folder itself for folder runs).
        output: PathBuf,
        backup: BackupRecord,
    },
    Failed {
        /// Human-readable cause, identical to the terminal event's text.
        reason: String,
    },
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// The caller's end of a run started by
/// [`PipelineOrchestrator::start`](crate::PipelineOrchestrator::start).
///
/// Updates are queued in emission order until read, so nothing is lost if the
/// handle is read late. Dropping the handle does not stop the run; call
/// [`cancel()`](Self::cancel) for that.
#[derive(Debug)]
pub struct RunHandle {
    target: Option<PathBuf>,
    updates: UnboundedReceiver<RunUpdate>,
    cancel: CancellationToken,
    task: JoinHandle<RunOutcome>,
}

impl RunHandle {
    pub(crate) fn new(
        target: Option<PathBuf>,
        updates: UnboundedReceiver<RunUpdate>,
        cancel: CancellationToken,
        task: JoinHandle<RunOutcome>,
    ) -> Self {
        Self {
            target,
            updates,
            cancel,
            task,
        }
    }

    /// The path the run was opened for, if it was started with
    /// [`open()`](crate::PipelineOrchestrator::open).
    pub fn target(&self) -> Option<&Path> {
        self.target.as_deref()
    }

    /// Ask the run to stop at its next suspension point.
    ///
    /// A run that has already handed the file to its strategy finishes that
    /// step first; the access grant is never released while a strategy may
    /// still be touching the file.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A token that cancels this run, for use after the handle has been
    /// moved into [`drive()`](Self::drive).
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Updates as they arrive. Ends after the terminal update.
    pub fn updates(&mut self) -> impl Stream<Item = RunUpdate> + '_ {
        stream!({
            while let Some(update) = self.updates.recv().await {
                yield update;
            }
        })
    }

    /// Feed every update to `observer`, in order, then return the outcome.
    pub async fn drive(mut self, observer: &mut impl Observer) -> RunOutcome {
        {
            let mut updates = pin!(self.updates());
            while let Some(update) = updates.next().await {
                observer.on_update(&update);
            }
        }
        self.outcome().await
    }

    /// Wait for the run to finish, discarding any unread updates.
    pub async fn outcome(self) -> RunOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(target = ?self.target, error = %e, "Pipeline run aborted");
                RunOutcome::Failed {
                    reason: "run aborted before reporting a result".to_string(),
                }
            },
        }
    }
}
