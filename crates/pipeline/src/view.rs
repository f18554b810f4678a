use crate::{LogEvent, RunState, RunUpdate};
use std::path::{Path, PathBuf};

/// Receives the updates of a run, in emission order.
///
/// A run has exactly one observer; it is called from whichever task drives
/// the [`RunHandle`](crate::RunHandle), never from the run itself.
pub trait Observer {
    fn on_update(&mut self, update: &RunUpdate);
}

impl<F> Observer for F
where
    F: FnMut(&RunUpdate),
{
    fn on_update(&mut self, update: &RunUpdate) {
        self(update)
    }
}

/// Single-owner state of one run, as seen by whoever displays it.
///
/// Only ever changed by applying [`RunUpdate`]s in arrival order.
#[derive(Debug, Clone, Default)]
pub struct RunView {
    target: Option<PathBuf>,
    progress: f64,
    state: RunState,
    events: Vec<LogEvent>,
}

impl RunView {
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: Some(target.into()),
            ..Self::default()
        }
    }

    pub fn target(&self) -> Option<&Path> {
        self.target.as_deref()
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn events(&self) -> &[LogEvent] {
        &self.events
    }

    pub fn last_event(&self) -> Option<&LogEvent> {
        self.events.last()
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn apply(&mut self, update: &RunUpdate) {
        self.progress = update.progress;
        self.state = update.state;
        self.events.push(update.event.clone());
    }
}

impl Observer for RunView {
    fn on_update(&mut self, update: &RunUpdate) {
        self.apply(update);
    }
}
