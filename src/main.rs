//! Back up a file (or folder), then process it, under a scoped access grant.
//!
//! Usage:
//!     safehold notes.txt
//!     safehold --category pdf-folder ~/Scans --step-delay 500

mod error;

use crate::error::{ErrorKind, Result, report};
use clap::Parser;
use exn::ResultExt;
use safehold_access::provider::LocalAccessProvider;
use safehold_backup::BackupStore;
use safehold_config::Config;
use safehold_pipeline::{Observer, PipelineOrchestrator, RunOutcome, RunUpdate, RunView, Severity};
use safehold_process::{FileCategory, ProcessorRegistry};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "safehold", version, about)]
struct Args {
    /// File or folder to process
    path: PathBuf,

    /// txt, pdf, yaml or pdf-folder (default: from configuration)
    #[arg(short, long)]
    category: Option<String>,

    /// Extra configuration file, applied over the default one
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pause between stages, in milliseconds
    #[arg(long)]
    step_delay: Option<u64>,
}

/// Prints each update as it arrives and keeps the run's state.
struct Printer {
    view: RunView,
}

impl Observer for Printer {
    fn on_update(&mut self, update: &RunUpdate) {
        self.view.apply(update);
        println!("{}", render(update));
    }
}

fn render(update: &RunUpdate) -> String {
    let marker = match update.event.severity {
        Severity::Info => " ",
        Severity::Warning => "!",
        Severity::Success => "+",
        Severity::Failure => "x",
    };
    format!("[{:>3.0}%] {marker} {}", update.progress * 100.0, update.event.text)
}

fn category(args: &Args, config: &Config) -> Result<FileCategory> {
    match &args.category {
        Some(name) => name.parse::<FileCategory>().or_raise(|| ErrorKind::Selection(format!("unknown category {name:?}"))),
        None => Ok(config.default_category),
    }
}

async fn run(args: Args) -> Result<bool> {
    let config = Config::load(args.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    let category = category(&args, &config)?;
    let path = std::path::absolute(&args.path).or_raise(|| ErrorKind::Selection(args.path.display().to_string()))?;
    if !category.accepts(&path) {
        let expected = match category.extensions() {
            [] => "a folder".to_string(),
            extensions => format!("a .{} file", extensions.join(" or .")),
        };
        exn::bail!(ErrorKind::Selection(format!("{} ({}) needs {expected}", path.display(), category.title())));
    }

    let access = LocalAccessProvider::new(&config.permitted_roots).or_raise(|| ErrorKind::Setup)?;
    let backups = BackupStore::new(config.backup_dir().or_raise(|| ErrorKind::Config)?).or_raise(|| ErrorKind::Setup)?;
    let step_delay = args.step_delay.map_or_else(|| config.step_delay_duration(), Duration::from_millis);
    let orchestrator = PipelineOrchestrator::new(Arc::new(access), backups, ProcessorRegistry::with_defaults())
        .with_step_delay(step_delay);

    let handle = orchestrator.open(&path, category).or_raise(|| ErrorKind::Start)?;
    let cancel = handle.cancellation();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted; cancelling run");
            cancel.cancel();
        }
    });

    let mut printer = Printer {
        view: RunView::new(&path),
    };
    let outcome = handle.drive(&mut printer).await;
    tracing::debug!(state = %printer.view.state(), events = printer.view.events().len(), "Run finished");
    if let RunOutcome::Completed { backup, .. } = &outcome {
        println!("Backup: {}", backup.stored_path.display());
    }
    Ok(outcome.is_completed())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("safehold: {}", report(&e));
            tracing::debug!(error = ?e, "Error details");
            ExitCode::from(2)
        },
    }
}
