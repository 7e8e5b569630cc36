//! Run configuration, resolved once at startup.

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::scan::ScanOptions;

/// Everything one audit run needs.
///
/// `work_dir` is the base for every relative path the run creates: the clone
/// is placed at `<work_dir>/<repo name>`.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    /// URL passed to `git clone`.
    pub git: String,
    /// Spec directory, relative to the clone root.
    pub spec: String,
    /// Application tree searched for event names.
    pub app_dir: PathBuf,
    pub work_dir: PathBuf,
    pub scan: ScanOptions,
    /// Leave the clone on disk after the run.
    pub keep_clone: bool,
    /// Suppress progress messages on stderr.
    pub quiet: bool,
}

impl AuditConfig {
    /// Configuration with default scan options, quiet, clone removed afterwards.
    pub fn new(
        git: impl Into<String>,
        spec: impl Into<String>,
        app_dir: impl Into<PathBuf>,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            git: git.into(),
            spec: spec.into(),
            app_dir: app_dir.into(),
            work_dir: work_dir.into(),
            scan: ScanOptions::default(),
            keep_clone: false,
            quiet: true,
        }
    }
}

/// Directory containing the running executable.
pub fn default_work_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe()
        .map_err(|e| Error::Config(format!("cannot locate the executable: {e}")))?;
    exe.parent()
        .map(|dir| dir.to_path_buf())
        .ok_or_else(|| Error::Config(format!("{} has no parent directory", exe.display())))
}
