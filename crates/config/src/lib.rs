//! Layered configuration.
//!
//! Values are merged, later layers winning:
//!
//! 1. built-in defaults ([`Config::default()`]);
//! 2. `config.toml` in the platform configuration directory;
//! 3. an explicitly given TOML file, if any;
//! 4. environment variables prefixed `SAFEHOLD_` (e.g. `SAFEHOLD_STEP_DELAY=250`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::{BaseDirs, ProjectDirs};
use exn::{OptionExt, ResultExt};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use safehold_process::FileCategory;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_APP_ID: &str = "dev.safehold.SafeHold";
pub const ENV_PREFIX: &str = "SAFEHOLD_";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Reverse-DNS application identifier (`qualifier.organization.application`).
    /// Keys the application-private data directory.
    pub app_id: String,
    /// Where backups are written. Defaults to `<data dir>/backups`.
    pub backup_dir: Option<PathBuf>,
    /// Directories inside which permission tokens may be created.
    pub permitted_roots: Vec<PathBuf>,
    /// Pause between pipeline stages, in milliseconds.
    pub step_delay: u64,
    /// Category used when none is given on the command line.
    pub default_category: FileCategory,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_id: DEFAULT_APP_ID.to_string(),
            backup_dir: None,
            permitted_roots: BaseDirs::new().map(|dirs| vec![dirs.home_dir().to_path_buf()]).unwrap_or_default(),
            step_delay: 0,
            default_category: FileCategory::default(),
        }
    }
}

impl Config {
    /// The full provider stack, without extracting anything.
    pub fn figment(explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = default_config_file() {
            figment = figment.merge(Toml::file(file));
        }
        if let Some(file) = explicit {
            figment = figment.merge(Toml::file_exact(file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load and validate configuration from every layer.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(file) = explicit
            && !file.is_file()
        {
            exn::bail!(ErrorKind::Invalid(format!("config file {} does not exist", file.display())));
        }
        Self::from_figment(&Self::figment(explicit))
    }

    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        tracing::debug!(?config, "Configuration loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.app_id.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("app_id must not be empty".to_string()));
        }
        if self.app_id.contains(['/', '\\']) {
            exn::bail!(ErrorKind::Invalid(format!("app_id {:?} must not contain path separators", self.app_id)));
        }
        if let Some(dir) = &self.backup_dir
            && !dir.is_absolute()
        {
            exn::bail!(ErrorKind::Invalid(format!("backup_dir {} must be absolute", dir.display())));
        }
        if self.permitted_roots.is_empty() {
            exn::bail!(ErrorKind::Invalid("at least one permitted root is required".to_string()));
        }
        if let Some(root) = self.permitted_roots.iter().find(|root| !root.is_absolute()) {
            exn::bail!(ErrorKind::Invalid(format!("permitted root {} must be absolute", root.display())));
        }
        Ok(())
    }

    /// Platform directories for [`app_id`](Self::app_id).
    pub fn project_dirs(&self) -> Option<ProjectDirs> {
        project_dirs(&self.app_id)
    }

    /// The configured backup directory, or `<data dir>/backups`.
    pub fn backup_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.backup_dir {
            return Ok(dir.clone());
        }
        self.project_dirs().map(|dirs| dirs.data_dir().join("backups")).ok_or_raise(|| ErrorKind::NoHomeDirectory)
    }

    pub fn step_delay_duration(&self) -> Duration {
        Duration::from_millis(self.step_delay)
    }
}

fn project_dirs(app_id: &str) -> Option<ProjectDirs> {
    match app_id.split('.').collect::<Vec<_>>().as_slice() {
        [qualifier, organization, application] => ProjectDirs::from(qualifier, organization, application),
        _ => ProjectDirs::from("", "", app_id),
    }
}

/// `config.toml` in the platform configuration directory for the default app id.
pub fn default_config_file() -> Option<PathBuf> {
    project_dirs(DEFAULT_APP_ID).map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}
