use crate::error::{ErrorKind, MemberFailure, Result};
use crate::{OUTPUT_PREFIX, Processor, ProcessorHandle};
use exn::ResultExt;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Composite strategy for a directory.
///
/// Lists the folder's immediate entries (no recursion), keeps regular files
/// whose extension matches case-insensitively, and hands each one to the
/// member strategy. Previous outputs (`processed_*`) are skipped so that
/// re-running over a folder doesn't process its own results.
///
/// A failing member never stops its siblings. If any member failed, the
/// result is an [`Aggregate`](ErrorKind::Aggregate) error naming each of
/// them; otherwise the folder's own path is returned.
pub struct FolderProcessor {
    member: ProcessorHandle,
    extension: String,
}

impl FolderProcessor {
    pub fn new(member: ProcessorHandle, extension: impl Into<String>) -> Self {
        Self {
            member,
            extension: extension.into(),
        }
    }

    fn matches(&self, path: &Path) -> bool {
        let extension = path.extension().and_then(|ext| ext.to_str());
        let prefixed = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(OUTPUT_PREFIX));
        !prefixed && extension.is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension))
    }

    /// Matching members, sorted so processing order is deterministic.
    fn members(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let read_err = || ErrorKind::Read(dir.to_path_buf());
        let mut members = Vec::new();
        for entry in std::fs::read_dir(dir).or_raise(read_err)? {
            let path = entry.or_raise(read_err)?.path();
            if !self.matches(&path) {
                continue;
            }
            // Follow symlinks; silently drop directories named `*.pdf` and
            // broken links.
            if std::fs::metadata(&path).is_ok_and(|m| m.is_file()) {
                members.push(path);
            }
        }
        members.sort();
        Ok(members)
    }
}

impl Processor for FolderProcessor {
    fn name(&self) -> &str {
        "folder"
    }

    #[instrument(skip(self), fields(member = self.member.name(), extension = %self.extension))]
    fn process(&self, path: &Path) -> Result<PathBuf> {
        let members = self.members(path)?;
        if members.is_empty() {
            tracing::warn!(folder = %path.display(), "No matching files in folder");
        }
        let total = members.len();
        let mut failures = Vec::new();
        for member in members {
            match self.member.process(&member) {
                Ok(output) => {
                    tracing::debug!(member = %member.display(), output = %output.display(), "Member processed");
                },
                Err(e) => {
                    let reason = (*e).to_string();
                    tracing::warn!(member = %member.display(), %reason, "Member failed");
                    failures.push(MemberFailure { path: member, reason });
                },
            }
        }
        if !failures.is_empty() {
            exn::bail!(ErrorKind::Aggregate { failures, total });
        }
        Ok(path.to_path_buf())
    }
}
