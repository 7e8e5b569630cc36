//! Cloning the repository that holds the OpenAPI specification.
//!
//! The clone lives at `<work_dir>/<repo name>`. Any stale clone at that path
//! is removed first so `git clone` never fails with "destination already
//! exists". The directory is owned by a [`ClonedRepo`] guard which removes it
//! on every exit path, including early returns through `?`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Derive the local directory name from a clone URL.
///
/// Takes the last `/`-separated segment and removes the first `.git` in it.
/// A trailing slash is ignored.
///
/// - `"https://host/org/repo.git"` → `"repo"`
/// - `"https://host/org/repo"` → `"repo"`
/// - `"git@host:org/repo.git"` → `"repo"`
pub fn repo_name(url: &str) -> String {
    let last = url.trim_end_matches('/').rsplit('/').next().unwrap_or(url);
    last.replacen(".git", "", 1)
}

/// Recursively delete `path`. A missing directory is not an error.
pub async fn remove_repo(path: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => {
            debug!(path = %path.display(), "Removed clone directory");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Remove {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Run `git clone <url> <target>`.
///
/// Arguments are passed as a vector, never through a shell.
pub async fn clone_repo(url: &str, target: &Path) -> Result<()> {
    debug!(url, target = %target.display(), "Running git clone");

    let output = Command::new("git")
        .arg("clone")
        .arg("--")
        .arg(url)
        .arg(target)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| Error::Clone {
            url: url.to_string(),
            reason: format!("failed to run git: {e}"),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Clone {
            url: url.to_string(),
            reason: stderr.trim().to_string(),
        });
    }

    Ok(())
}

/// A freshly cloned repository that is deleted when no longer needed.
///
/// Call [`ClonedRepo::cleanup`] on the success path to surface removal
/// errors. If the guard is dropped without cleanup (an error propagated
/// past it) the directory is removed synchronously and failures are only
/// logged.
#[derive(Debug)]
pub struct ClonedRepo {
    path: PathBuf,
    keep: bool,
    armed: bool,
}

impl ClonedRepo {
    /// Remove any stale clone of `url` under `work_dir`, then clone it fresh.
    pub async fn fetch(url: &str, work_dir: &Path) -> Result<Self> {
        let name = repo_name(url);
        if name.is_empty() || name == "." || name == ".." {
            return Err(Error::Config(format!(
                "cannot derive a repository name from '{url}'"
            )));
        }

        let path = work_dir.join(&name);
        remove_repo(&path).await?;

        // Arm the guard before cloning so a half-written clone is removed too.
        let repo = Self {
            path,
            keep: false,
            armed: true,
        };
        clone_repo(url, &repo.path).await?;
        Ok(repo)
    }

    /// Root directory of the clone.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Leave the clone on disk after the run.
    pub fn keep(mut self, keep: bool) -> Self {
        self.keep = keep;
        self
    }

    /// Delete the clone now, reporting removal failures.
    pub async fn cleanup(mut self) -> Result<()> {
        self.armed = false;
        if self.keep {
            debug!(path = %self.path.display(), "Keeping clone directory");
            return Ok(());
        }
        remove_repo(&self.path).await
    }
}

impl Drop for ClonedRepo {
    fn drop(&mut self) {
        if !self.armed || self.keep {
            return;
        }
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed clone directory on drop"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove clone directory"
            ),
        }
    }
}
