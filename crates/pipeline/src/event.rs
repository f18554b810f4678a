use std::fmt::{Display, Formatter, Result as FmtResult};

/// How an event should be presented.
///
/// Attached when the event is emitted; never inferred from the text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    /// Something is off but the run carries on (e.g. a stale token).
    Warning,
    Success,
    Failure,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// One line of the user-facing run log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEvent {
    pub text: String,
    pub severity: Severity,
}

impl LogEvent {
    pub fn new(severity: Severity, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity,
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(Severity::Info, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(Severity::Warning, text)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(Severity::Success, text)
    }

    pub fn failure(text: impl Into<String>) -> Self {
        Self::new(Severity::Failure, text)
    }
}

impl Display for LogEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "[{}] {}", self.severity, self.text)
    }
}

/// Where a run is in `Idle → TokenAcquired → BackedUp → Processing → Completed`.
///
/// `Failed` can follow any state; `Completed` and `Failed` are terminal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RunState {
    #[default]
    Idle,
    TokenAcquired,
    BackedUp,
    Processing,
    Completed,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::TokenAcquired => "token-acquired",
            Self::BackedUp => "backed-up",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl Display for RunState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// What a run hands its observer: overall progress in `[0, 1]`, the state
/// the run has just entered, and the event that goes with it.
#[derive(Clone, Debug, PartialEq)]
pub struct RunUpdate {
    pub progress: f64,
    pub state: RunState,
    pub event: LogEvent,
}
