use crate::error::{ErrorKind, Result};
use crate::{LogEvent, RunHandle, RunOutcome, RunState, RunUpdate};
use exn::ResultExt;
use safehold_access::{AccessHandle, PermissionToken, ScopedAccessGuard};
use safehold_backup::{BackupRecord, BackupStore};
use safehold_process::{FileCategory, ProcessorRegistry};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, instrument};

const PROGRESS_ACQUIRED: f64 = 0.1;
const PROGRESS_BACKED_UP: f64 = 0.5;
const PROGRESS_COMPLETE: f64 = 1.0;

/// Runs `acquire → back up → process → release` for one selection at a time.
///
/// Each run executes as a background task and reports to a [`RunHandle`].
/// While a run is active, [`start()`](Self::start) rejects new runs with
/// [`Busy`](ErrorKind::Busy). The access grant is always released before the
/// terminal update is sent, and the orchestrator stops being busy in between,
/// so an observer reacting to the terminal update can start the next run.
///
/// # Examples
///
/// ```no_run
/// use safehold_access::provider::LocalAccessProvider;
/// use safehold_backup::BackupStore;
/// use safehold_pipeline::{PipelineOrchestrator, RunView};
/// use safehold_process::{FileCategory, ProcessorRegistry};
/// use std::path::Path;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let access = Arc::new(LocalAccessProvider::new(["/home/user"])?);
/// let backups = BackupStore::new("/home/user/.local/share/safehold/backups")?;
/// let orchestrator = PipelineOrchestrator::new(access, backups, ProcessorRegistry::with_defaults());
///
/// let run = orchestrator.open(Path::new("/home/user/notes.txt"), FileCategory::PlainText)?;
/// let mut view = RunView::new("/home/user/notes.txt");
/// let outcome = run.drive(&mut view).await;
/// assert!(outcome.is_completed());
/// # Ok(())
/// # }
/// ```
pub struct PipelineOrchestrator {
    access: AccessHandle,
    backups: BackupStore,
    registry: Arc<ProcessorRegistry>,
    step_delay: Duration,
    busy: Arc<AtomicBool>,
}

impl PipelineOrchestrator {
    pub fn new(access: AccessHandle, backups: BackupStore, registry: ProcessorRegistry) -> Self {
        Self {
            access,
            backups,
            registry: Arc::new(registry),
            step_delay: Duration::ZERO,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Pause between stages. Cancellation is observed during the pause.
    #[must_use]
    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Mint a token for a path the user selected.
    pub fn create_token(&self, path: &Path) -> Result<PermissionToken> {
        self.access.create_token(path).or_raise(|| ErrorKind::TokenCreation(path.to_path_buf()))
    }

    /// [`create_token()`](Self::create_token) then [`start()`](Self::start).
    ///
    /// The handle is labelled with `path`.
    pub fn open(&self, path: &Path, category: FileCategory) -> Result<RunHandle> {
        let token = self.create_token(path)?;
        self.launch(token, category, Some(path.to_path_buf()))
    }

    /// Start a run in the background.
    ///
    /// Must be called from within a Tokio runtime. Every failure past the
    /// busy check is reported through the returned handle, never here. The
    /// handle has no [`target()`](RunHandle::target); the resolved path is
    /// reported with the `TokenAcquired` update.
    ///
    /// # Errors
    ///
    /// [`Busy`](ErrorKind::Busy) if a run is still active.
    pub fn start(&self, token: PermissionToken, category: FileCategory) -> Result<RunHandle> {
        self.launch(token, category, None)
    }

    /// The token is only resolved inside the run, off the caller's context.
    #[instrument(skip(self, token), fields(provider = self.access.name()))]
    fn launch(&self, token: PermissionToken, category: FileCategory, target: Option<PathBuf>) -> Result<RunHandle> {
        if self.busy.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err() {
            tracing::warn!("Rejected run; another run is active");
            exn::bail!(ErrorKind::Busy);
        }
        let busy = BusyFlag(Arc::clone(&self.busy));

        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let run = Run {
            access: Arc::clone(&self.access),
            backups: self.backups.clone(),
            registry: Arc::clone(&self.registry),
            step_delay: self.step_delay,
            category,
            cancel: cancel.clone(),
            emitter: Emitter { tx, progress: 0.0 },
        };
        let span = tracing::info_span!("run", %category, target = tracing::field::Empty);
        let task = tokio::spawn(run.execute(token, busy).instrument(span));
        Ok(RunHandle::new(target, rx, cancel, task))
    }
}

/// Marks the orchestrator busy for as long as it lives.
struct BusyFlag(Arc<AtomicBool>);

impl Drop for BusyFlag {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Sends updates in order; progress never goes backwards.
struct Emitter {
    tx: UnboundedSender<RunUpdate>,
    progress: f64,
}

impl Emitter {
    fn emit(&mut self, progress: f64, state: RunState, event: LogEvent) {
        self.progress = self.progress.max(progress);
        tracing::debug!(progress = self.progress, %state, severity = %event.severity, text = %event.text, "Run update");
        let update = RunUpdate {
            progress: self.progress,
            state,
            event,
        };
        if self.tx.send(update).is_err() {
            tracing::trace!("Run handle dropped; update discarded");
        }
    }
}

struct Run {
    access: AccessHandle,
    backups: BackupStore,
    registry: Arc<ProcessorRegistry>,
    step_delay: Duration,
    category: FileCategory,
    cancel: CancellationToken,
    emitter: Emitter,
}

impl Run {
    async fn execute(mut self, token: PermissionToken, busy: BusyFlag) -> RunOutcome {
        self.emitter.emit(0.0, RunState::Idle, LogEvent::info(format!("Starting {} run", self.category.title())));
        // The guard lives and dies inside `stages()`.
        let result = self.stages(&token).await;
        drop(busy);

        match result {
            Ok((output, backup)) => {
                tracing::info!(output = %output.display(), "Run completed");
                let text = format!("Processed {} into {}", backup.source_name, output.display());
                self.emitter.emit(PROGRESS_COMPLETE, RunState::Completed, LogEvent::success(text));
                RunOutcome::Completed { output, backup }
            },
            Err(e) => {
                let reason = (*e).to_string();
                tracing::warn!(%reason, "Run failed");
                let progress = self.emitter.progress;
                self.emitter.emit(progress, RunState::Failed, LogEvent::failure(reason.clone()));
                RunOutcome::Failed { reason }
            },
        }
    }

    async fn stages(&mut self, token: &PermissionToken) -> Result<(PathBuf, BackupRecord)> {
        let guard = ScopedAccessGuard::acquire(&self.access, token).map_err(|e| {
            let reason = (*e).to_string();
            e.raise(ErrorKind::Access { reason })
        })?;
        let path = guard.path().to_path_buf();
        tracing::Span::current().record("target", tracing::field::display(path.display()));
        if guard.is_stale() {
            let text = format!("Permission for {} is stale; continuing with best effort", path.display());
            self.emitter.emit(PROGRESS_ACQUIRED, RunState::TokenAcquired, LogEvent::warning(text));
        }
        self.emitter.emit(
            PROGRESS_ACQUIRED,
            RunState::TokenAcquired,
            LogEvent::info(format!("Access granted to {}", path.display())),
        );
        self.pause().await?;

        let backup = tokio::select! {
            biased;
            () = self.cancel.cancelled() => exn::bail!(ErrorKind::Cancelled),
            result = self.backups.backup(&path) => result.map_err(|e| {
                let reason = (*e).to_string();
                e.raise(ErrorKind::Backup { reason })
            })?,
        };
        self.emitter.emit(
            PROGRESS_BACKED_UP,
            RunState::BackedUp,
            LogEvent::info(format!("Backup saved to {}", backup.stored_path.display())),
        );
        self.pause().await?;

        let output = self.process(&path).await?;
        drop(guard);
        Ok((output, backup))
    }

    /// Run the category's strategy on the blocking pool and wait for it.
    ///
    /// Cancellation is not observed here: the caller still holds the access
    /// guard, and must keep holding it until the strategy is done.
    async fn process(&mut self, path: &Path) -> Result<PathBuf> {
        let category = self.category;
        let processing_err = |reason: String| ErrorKind::Processing { category, reason };
        let processor = self.registry.get(category).map_err(|e| {
            let reason = (*e).to_string();
            e.raise(processing_err(reason))
        })?;
        self.emitter.emit(
            PROGRESS_BACKED_UP,
            RunState::Processing,
            LogEvent::info(format!("Processing with {} strategy", processor.name())),
        );

        let target = path.to_path_buf();
        let joined = tokio::task::spawn_blocking(move || processor.process(&target)).await;
        match joined {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => {
                let reason = (*e).to_string();
                Err(e.raise(processing_err(reason)))
            },
            Err(join_err) => {
                tracing::error!(error = %join_err, "Processor panicked");
                Err(join_err).or_raise(|| processing_err("processor panicked".to_string()))
            },
        }
    }

    async fn pause(&self) -> Result<()> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => exn::bail!(ErrorKind::Cancelled),
            () = tokio::time::sleep(self.step_delay) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RunView, Severity};
    use regex::Regex;
    use safehold_access::provider::{AccessCall, MockAccessProvider};
    use safehold_process::Processor;
    use safehold_process::error::{ErrorKind as ProcessErrorKind, Result as ProcessResult};
    use std::fs;
    use std::sync::Mutex;

    struct Fixture {
        _temp_dir: tempfile::TempDir,
        work: PathBuf,
        backups: PathBuf,
        mock: Arc<MockAccessProvider>,
    }

    impl Fixture {
        fn new(provider: MockAccessProvider) -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            let work = temp_dir.path().join("work");
            fs::create_dir(&work).unwrap();
            Self {
                backups: temp_dir.path().join("backups"),
                _temp_dir: temp_dir,
                work,
                mock: Arc::new(provider),
            }
        }

        fn orchestrator(&self, registry: ProcessorRegistry) -> PipelineOrchestrator {
            let access: AccessHandle = self.mock.clone();
            PipelineOrchestrator::new(access, BackupStore::new(&self.backups).unwrap(), registry)
        }

        fn write(&self, name: &str, contents: &[u8]) -> PathBuf {
            let path = self.work.join(name);
            fs::write(&path, contents).unwrap();
            path
        }

        fn backup_names(&self) -> Vec<String> {
            let Ok(entries) = fs::read_dir(&self.backups) else {
                return vec![];
            };
            entries.map(|e| e.unwrap().file_name().to_string_lossy().into_owned()).collect()
        }
    }

    async fn run_to_end(
        orchestrator: &PipelineOrchestrator,
        path: &Path,
        category: FileCategory,
    ) -> (RunView, RunOutcome) {
        let run = orchestrator.open(path, category).unwrap();
        let mut view = RunView::new(path);
        let outcome = run.drive(&mut view).await;
        (view, outcome)
    }

    /// Runs a closure instead of a real strategy.
    struct Scripted<F>(F);
    impl<F> Processor for Scripted<F>
    where
        F: Fn(&Path) -> ProcessResult<PathBuf> + Send + Sync,
    {
        fn name(&self) -> &str {
            "scripted"
        }
        fn process(&self, path: &Path) -> ProcessResult<PathBuf> {
            (self.0)(path)
        }
    }

    #[tokio::test]
    async fn test_notes_scenario() {
        let fixture = Fixture::new(MockAccessProvider::new());
        let notes = fixture.write("notes.txt", b"hello");
        let orchestrator = fixture.orchestrator(ProcessorRegistry::with_defaults());

        let (view, outcome) = run_to_end(&orchestrator, &notes, FileCategory::PlainText).await;

        assert_eq!(fs::read_to_string(fixture.work.join("processed_notes.txt")).unwrap(), "HELLO");
        assert_eq!(fs::read_to_string(&notes).unwrap(), "hello");
        let names = fixture.backup_names();
        assert_eq!(names.len(), 1);
        let pattern = Regex::new(r"^notes_Backup_\d{4}-\d{2}-\d{2}T\d{2}-\d{2}-\d{2}\.\d{6}Z\.txt$").unwrap();
        assert!(pattern.is_match(&names[0]), "unexpected backup name {}", names[0]);
        assert_eq!(fs::read_to_string(fixture.backups.join(&names[0])).unwrap(), "hello");

        let RunOutcome::Completed { output, backup } = outcome else {
            panic!("run did not complete");
        };
        assert_eq!(output, fixture.work.join("processed_notes.txt"));
        assert_eq!(backup.source_name, "notes.txt");
        assert_eq!(view.state(), RunState::Completed);
        assert_eq!(view.progress(), 1.0);
        assert_eq!(view.last_event().unwrap().severity, Severity::Success);
    }

    #[tokio::test]
    async fn test_state_sequence_and_progress() {
        let fixture = Fixture::new(MockAccessProvider::new());
        let notes = fixture.write("notes.txt", b"hello");
        let orchestrator = fixture.orchestrator(ProcessorRegistry::with_defaults());

        let run = orchestrator.open(&notes, FileCategory::PlainText).unwrap();
        let mut updates = Vec::new();
        run.drive(&mut |u: &RunUpdate| updates.push(u.clone())).await;

        let states: Vec<_> = updates.iter().map(|u| u.state).collect();
        assert_eq!(
            states,
            [
                RunState::Idle,
                RunState::TokenAcquired,
                RunState::BackedUp,
                RunState::Processing,
                RunState::Completed,
            ]
        );
        let progress: Vec<_> = updates.iter().map(|u| u.progress).collect();
        assert_eq!(progress, [0.0, 0.1, 0.5, 0.5, 1.0]);
        assert!(updates.iter().all(|u| u.event.severity != Severity::Warning));
    }

    #[tokio::test]
    async fn test_release_exactly_once_before_terminal_update() {
        let fixture = Fixture::new(MockAccessProvider::new());
        let notes = fixture.write("notes.txt", b"hello");
        let orchestrator = fixture.orchestrator(ProcessorRegistry::with_defaults());

        let run = orchestrator.open(&notes, FileCategory::PlainText).unwrap();
        let mut checked = false;
        let outcome = run
            .drive(&mut |u: &RunUpdate| {
                if u.state.is_terminal() {
                    assert_eq!(fixture.mock.active(), 0);
                    assert!(!orchestrator.is_busy());
                    checked = true;
                }
            })
            .await;

        assert!(outcome.is_completed());
        assert!(checked);
        assert_eq!(fixture.mock.calls(), [AccessCall::Begin(notes.clone()), AccessCall::End(notes)]);
    }

    #[tokio::test]
    async fn test_backup_exists_before_processing() {
        let fixture = Fixture::new(MockAccessProvider::new());
        let notes = fixture.write("notes.txt", b"original bytes");
        let backups = fixture.backups.clone();
        let mock = Arc::clone(&fixture.mock);
        let seen = Arc::new(Mutex::new(None));
        let record = Arc::clone(&seen);
        let scripted = Scripted(move |path: &Path| -> ProcessResult<PathBuf> {
            let snapshot: Vec<_> =
                fs::read_dir(&backups).unwrap().map(|e| fs::read(e.unwrap().path()).unwrap()).collect();
            *record.lock().unwrap() = Some((snapshot, mock.active()));
            fs::write(path, b"mutated").unwrap();
            Ok(path.to_path_buf())
        });
        let registry = ProcessorRegistry::new().with(FileCategory::PlainText, Arc::new(scripted));
        let orchestrator = fixture.orchestrator(registry);

        let (_, outcome) = run_to_end(&orchestrator, &notes, FileCategory::PlainText).await;

        assert!(outcome.is_completed());
        let (snapshot, active) = seen.lock().unwrap().take().unwrap();
        assert_eq!(snapshot, [b"original bytes".to_vec()]);
        assert_eq!(active, 1, "processing must run while access is held");
    }

    #[tokio::test]
    async fn test_folder_with_one_bad_pdf() {
        let fixture = Fixture::new(MockAccessProvider::new());
        let inbox = fixture.work.join("inbox");
        fs::create_dir(&inbox).unwrap();
        fs::write(inbox.join("a.pdf"), b"%PDF-1.7 a").unwrap();
        fs::write(inbox.join("b.pdf"), b"garbage").unwrap();
        fs::write(inbox.join("c.PDF"), b"%PDF-1.7 c").unwrap();
        let orchestrator = fixture.orchestrator(ProcessorRegistry::with_defaults());

        let (view, outcome) = run_to_end(&orchestrator, &inbox, FileCategory::PdfFolder).await;

        let RunOutcome::Failed { reason } = outcome else {
            panic!("folder run should fail");
        };
        assert!(reason.starts_with("pdf-folder processing failed: 1 of 3 files failed: b.pdf"), "{reason}");
        assert!(!reason.contains("a.pdf") && !reason.contains("c.PDF"), "{reason}");
        assert!(inbox.join("processed_a.pdf").exists());
        assert!(inbox.join("processed_c.PDF").exists());
        assert!(!inbox.join("processed_b.pdf").exists());
        assert_eq!(view.state(), RunState::Failed);
        assert_eq!(view.last_event().unwrap().text, reason);

        // The whole folder was backed up first, untouched.
        let names = fixture.backup_names();
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("inbox_Backup_"));
        assert_eq!(fs::read(fixture.backups.join(&names[0]).join("b.pdf")).unwrap(), b"garbage");
        assert_eq!(fixture.mock.active(), 0);
    }

    #[tokio::test]
    async fn test_busy_rejects_second_run() {
        let fixture = Fixture::new(MockAccessProvider::new());
        let notes = fixture.write("notes.txt", b"hello");
        let orchestrator =
            fixture.orchestrator(ProcessorRegistry::with_defaults()).with_step_delay(Duration::from_secs(30));

        let first = orchestrator.open(&notes, FileCategory::PlainText).unwrap();
        assert!(orchestrator.is_busy());
        let err = orchestrator.open(&notes, FileCategory::PlainText).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Busy));

        first.cancel();
        first.outcome().await;
        assert!(!orchestrator.is_busy());
        assert_eq!(fixture.mock.active(), 0);
        assert_eq!(fixture.mock.begins(), 1);
    }

    #[tokio::test]
    async fn test_cancel_during_pause() {
        let fixture = Fixture::new(MockAccessProvider::new());
        let notes = fixture.write("notes.txt", b"hello");
        let orchestrator =
            fixture.orchestrator(ProcessorRegistry::with_defaults()).with_step_delay(Duration::from_secs(30));

        let run = orchestrator.open(&notes, FileCategory::PlainText).unwrap();
        run.cancel();
        assert!(run.is_cancelled());
        let mut view = RunView::default();
        let outcome = run.drive(&mut view).await;

        assert_eq!(outcome, RunOutcome::Failed { reason: "cancelled".to_string() });
        assert_eq!(view.state(), RunState::Failed);
        assert!(!fixture.work.join("processed_notes.txt").exists());
        assert_eq!(fixture.mock.begins(), fixture.mock.ends());
    }

    #[rstest::rstest]
    #[case::denied(MockAccessProvider::new().with_denied_access(), "access failed: access denied")]
    #[case::unresolvable(MockAccessProvider::new().with_unresolvable_tokens(), "access failed: cannot resolve")]
    #[tokio::test]
    async fn test_acquisition_failure(#[case] provider: MockAccessProvider, #[case] prefix: &str) {
        let fixture = Fixture::new(provider);
        let notes = fixture.write("notes.txt", b"hello");
        let orchestrator = fixture.orchestrator(ProcessorRegistry::with_defaults());

        let (view, outcome) = run_to_end(&orchestrator, &notes, FileCategory::PlainText).await;

        let RunOutcome::Failed { reason } = outcome else {
            panic!("run should fail");
        };
        assert!(reason.starts_with(prefix), "{reason}");
        assert_eq!(view.events().len(), 2);
        assert_eq!(view.progress(), 0.0);
        assert!(fixture.mock.calls().is_empty());
        assert!(fixture.backup_names().is_empty());
    }

    #[tokio::test]
    async fn test_start_leaves_resolution_to_the_run() {
        let fixture = Fixture::new(MockAccessProvider::new().with_unresolvable_tokens());
        let notes = fixture.write("notes.txt", b"hello");
        let orchestrator = fixture.orchestrator(ProcessorRegistry::with_defaults());

        let token = orchestrator.create_token(&notes).unwrap();
        let run = orchestrator.start(token, FileCategory::PlainText).unwrap();
        assert_eq!(run.target(), None);
        let mut view = RunView::default();
        let outcome = run.drive(&mut view).await;
        assert!(!outcome.is_completed());
        assert!(view.last_event().unwrap().text.starts_with("access failed"));

        let run = orchestrator.open(&notes, FileCategory::PlainText).unwrap();
        assert_eq!(run.target(), Some(notes.as_path()));
        run.outcome().await;
    }

    #[tokio::test]
    async fn test_vanished_target_releases_grant() {
        let fixture = Fixture::new(MockAccessProvider::new());
        let gone = fixture.work.join("gone.txt");
        let orchestrator = fixture.orchestrator(ProcessorRegistry::with_defaults());

        let (_, outcome) = run_to_end(&orchestrator, &gone, FileCategory::PlainText).await;

        assert!(!outcome.is_completed());
        assert_eq!(fixture.mock.calls(), [AccessCall::Begin(gone.clone()), AccessCall::End(gone)]);
    }

    #[tokio::test]
    async fn test_stale_token_warns_and_continues() {
        let fixture = Fixture::new(MockAccessProvider::new().with_stale_tokens());
        let notes = fixture.write("notes.txt", b"hello");
        let orchestrator = fixture.orchestrator(ProcessorRegistry::with_defaults());

        let (view, outcome) = run_to_end(&orchestrator, &notes, FileCategory::PlainText).await;

        assert!(outcome.is_completed());
        let warnings: Vec<_> = view.events().iter().filter(|e| e.severity == Severity::Warning).collect();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].text.contains("stale"));
    }

    #[tokio::test]
    async fn test_backup_failure_skips_processing() {
        let fixture = Fixture::new(MockAccessProvider::new());
        let notes = fixture.write("notes.txt", b"hello");
        // A file where the backup directory should be.
        fs::write(&fixture.backups, b"in the way").unwrap();
        let orchestrator = fixture.orchestrator(ProcessorRegistry::with_defaults());

        let (view, outcome) = run_to_end(&orchestrator, &notes, FileCategory::PlainText).await;

        let RunOutcome::Failed { reason } = outcome else {
            panic!("run should fail");
        };
        assert!(reason.starts_with("backup failed:"), "{reason}");
        assert!(!fixture.work.join("processed_notes.txt").exists());
        assert!(view.events().iter().all(|e| !e.text.starts_with("Processing")));
        assert_eq!(fixture.mock.active(), 0);
        assert_eq!(fixture.mock.ends(), 1);
    }

    #[tokio::test]
    async fn test_panicking_processor_is_a_failure() {
        let fixture = Fixture::new(MockAccessProvider::new());
        let notes = fixture.write("notes.txt", b"hello");
        let scripted = Scripted(|_: &Path| -> ProcessResult<PathBuf> { panic!("strategy bug") });
        let registry = ProcessorRegistry::new().with(FileCategory::PlainText, Arc::new(scripted));
        let orchestrator = fixture.orchestrator(registry);

        let (view, outcome) = run_to_end(&orchestrator, &notes, FileCategory::PlainText).await;

        assert_eq!(
            outcome,
            RunOutcome::Failed {
                reason: "txt processing failed: processor panicked".to_string()
            }
        );
        assert_eq!(view.state(), RunState::Failed);
        assert_eq!(fixture.mock.active(), 0);
        assert!(!orchestrator.is_busy());
    }

    #[tokio::test]
    async fn test_unregistered_category() {
        let fixture = Fixture::new(MockAccessProvider::new());
        let notes = fixture.write("notes.yaml", b"a: 1");
        let orchestrator = fixture.orchestrator(ProcessorRegistry::new());

        let (_, outcome) = run_to_end(&orchestrator, &notes, FileCategory::YamlDocument).await;

        let RunOutcome::Failed { reason } = outcome else {
            panic!("run should fail");
        };
        assert_eq!(reason, "yaml processing failed: no processor registered for yaml");
        // The backup still happened; nothing is transformed without one.
        assert_eq!(fixture.backup_names().len(), 1);
    }

    #[tokio::test]
    async fn test_strategy_error_is_reported() {
        let fixture = Fixture::new(MockAccessProvider::new());
        let notes = fixture.write("notes.txt", b"hello");
        let scripted = Scripted(|path: &Path| -> ProcessResult<PathBuf> {
            exn::bail!(ProcessErrorKind::Write(path.to_path_buf()))
        });
        let registry = ProcessorRegistry::new().with(FileCategory::PlainText, Arc::new(scripted));
        let orchestrator = fixture.orchestrator(registry);

        let (_, outcome) = run_to_end(&orchestrator, &notes, FileCategory::PlainText).await;

        let RunOutcome::Failed { reason } = outcome else {
            panic!("run should fail");
        };
        assert!(reason.starts_with("txt processing failed: cannot write"), "{reason}");
        assert_eq!(fixture.mock.ends(), 1);
    }

    #[tokio::test]
    async fn test_next_run_after_completion() {
        let fixture = Fixture::new(MockAccessProvider::new());
        let notes = fixture.write("notes.txt", b"hello");
        let orchestrator = fixture.orchestrator(ProcessorRegistry::with_defaults());

        for _ in 0..2 {
            let (_, outcome) = run_to_end(&orchestrator, &notes, FileCategory::PlainText).await;
            assert!(outcome.is_completed());
        }
        assert_eq!(fixture.backup_names().len(), 2);
        assert_eq!(fixture.mock.begins(), 2);
        assert_eq!(fixture.mock.ends(), 2);
    }

    #[tokio::test]
    async fn test_create_token_failure() {
        let fixture = Fixture::new(MockAccessProvider::new());
        let orchestrator = fixture.orchestrator(ProcessorRegistry::with_defaults());
        #[cfg(unix)]
        {
            use std::os::unix::ffi::OsStrExt;
            let invalid = Path::new(std::ffi::OsStr::from_bytes(b"/tmp/\xff.txt"));
            let err = orchestrator.open(invalid, FileCategory::PlainText).unwrap_err();
            assert!(matches!(&*err, ErrorKind::TokenCreation(_)));
            assert!(!orchestrator.is_busy());
        }
    }
}
