//! Searching the application tree for event names.
//!
//! Every event is searched independently as a literal, case-sensitive,
//! whole-word match. Searches run on a bounded pool with a per-search
//! timeout, and each one yields a [`SearchOutcome`] that keeps "no match"
//! apart from "the search itself failed".

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use regex::bytes::Regex;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Default number of searches allowed to run at once.
pub const DEFAULT_CONCURRENCY: usize = 16;

/// Default per-search time limit.
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

/// How a single search is carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SearchEngine {
    /// `grep -r -w -F` as a child process.
    #[default]
    Grep,
    /// In-process directory walk with a word-boundary regex.
    Builtin,
}

/// Result of searching for one event name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// At least one whole-word occurrence exists.
    Found,
    /// The search completed and found nothing.
    NotFound,
    /// The search could not complete; the name was not checked.
    Failed(String),
}

impl SearchOutcome {
    /// Usage verdict: only a confirmed match counts as used.
    pub fn is_used(&self) -> bool {
        matches!(self, SearchOutcome::Found)
    }
}

/// Tuning for [`find_unused_events`].
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub engine: SearchEngine,
    /// Maximum searches in flight. Values below 1 are treated as 1.
    pub concurrency: usize,
    pub timeout: Duration,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            engine: SearchEngine::default(),
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_SEARCH_TIMEOUT,
        }
    }
}

/// An event whose search failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UncheckedEvent {
    pub name: String,
    pub reason: String,
}

/// Verdicts for a whole batch of events, in extraction order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanReport {
    /// Events with a confirmed zero-match search.
    pub unused: Vec<String>,
    /// Events whose search failed or timed out.
    pub unchecked: Vec<UncheckedEvent>,
    /// Number of events found at least once.
    pub used: usize,
}

/// Search for every event under `dir` and partition them by outcome.
///
/// All searches are launched up front and gated by a semaphore of
/// `options.concurrency` permits. The timeout starts once a search holds a
/// permit.
pub async fn find_unused_events(
    events: &[String],
    dir: &Path,
    options: &ScanOptions,
) -> Result<ScanReport> {
    let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let mut tasks = Vec::with_capacity(events.len());

    for event in events {
        let sem = semaphore.clone();
        let name = event.clone();
        let dir = dir.to_path_buf();
        let engine = options.engine;
        let timeout = options.timeout;

        tasks.push(tokio::spawn(async move {
            let Ok(_permit) = sem.acquire().await else {
                return SearchOutcome::Failed("search pool closed".to_string());
            };
            search(engine, &name, &dir, timeout).await
        }));
    }

    let mut report = ScanReport::default();
    for (event, task) in events.iter().zip(tasks) {
        let outcome = task
            .await
            .map_err(|e| Error::Runtime(format!("search for '{event}' panicked: {e}")))?;
        debug!(event = %event, ?outcome, "Search finished");

        match outcome {
            SearchOutcome::Found => report.used += 1,
            SearchOutcome::NotFound => report.unused.push(event.clone()),
            SearchOutcome::Failed(reason) => {
                warn!(event = %event, %reason, "Search failed");
                report.unchecked.push(UncheckedEvent {
                    name: event.clone(),
                    reason,
                });
            }
        }
    }

    Ok(report)
}

/// Run one whole-word literal search for `name` under `dir`.
pub async fn search(
    engine: SearchEngine,
    name: &str,
    dir: &Path,
    timeout: Duration,
) -> SearchOutcome {
    let timed_out = || {
        SearchOutcome::Failed(format!("timed out after {}ms", timeout.as_millis()))
    };

    // `None` means the time limit ran out, either at the tokio timer or at
    // the walker's own deadline check.
    let outcome = match engine {
        SearchEngine::Grep => tokio::time::timeout(timeout, grep_search(name, dir))
            .await
            .ok(),
        SearchEngine::Builtin => {
            let deadline = Instant::now() + timeout;
            tokio::time::timeout(timeout, builtin_search(name, dir, deadline))
                .await
                .ok()
                .flatten()
        }
    };

    outcome.unwrap_or_else(timed_out)
}

async fn grep_search(name: &str, dir: &Path) -> SearchOutcome {
    // `-F` keeps the name literal; `-e` and `--` stop a leading `-` from
    // being read as an option.
    let output = Command::new("grep")
        .args(["-r", "-w", "-F", "-q", "-e"])
        .arg(name)
        .arg("--")
        .arg(dir)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await;

    let output = match output {
        Ok(output) => output,
        Err(e) => return SearchOutcome::Failed(format!("failed to run grep: {e}")),
    };

    match output.status.code() {
        Some(0) => SearchOutcome::Found,
        Some(1) => SearchOutcome::NotFound,
        Some(code) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            SearchOutcome::Failed(format!("grep exited with status {code}: {}", stderr.trim()))
        }
        None => SearchOutcome::Failed("grep was terminated by a signal".to_string()),
    }
}

async fn builtin_search(name: &str, dir: &Path, deadline: Instant) -> Option<SearchOutcome> {
    let pattern = match word_pattern(name) {
        Ok(pattern) => pattern,
        Err(e) => return Some(SearchOutcome::Failed(format!("invalid pattern: {e}"))),
    };
    let root = dir.to_path_buf();

    tokio::task::spawn_blocking(move || walk_for_match(&pattern, &root, deadline))
        .await
        .unwrap_or_else(|e| Some(SearchOutcome::Failed(format!("search task failed: {e}"))))
}

/// Regex matching `name` literally where no word character touches it,
/// following grep's `-w` rule on each line.
pub fn word_pattern(name: &str) -> std::result::Result<Regex, regex::Error> {
    Regex::new(&format!(
        r"(?m)(?:^|(?-u:[^A-Za-z0-9_])){}(?:(?-u:[^A-Za-z0-9_])|$)",
        regex::escape(name)
    ))
}

/// Walk `root` until a file matches. Returns `None` once `deadline` passes.
fn walk_for_match(pattern: &Regex, root: &Path, deadline: Instant) -> Option<SearchOutcome> {
    if !root.exists() {
        return Some(SearchOutcome::Failed(format!("{} does not exist", root.display())));
    }

    for entry in WalkDir::new(root) {
        if Instant::now() >= deadline {
            return None;
        }

        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        match std::fs::read(entry.path()) {
            Ok(bytes) if pattern.is_match(&bytes) => return Some(SearchOutcome::Found),
            Ok(_) => {}
            Err(e) => {
                debug!(path = %entry.path().display(), error = %e, "Skipping unreadable file")
            }
        }
    }

    Some(SearchOutcome::NotFound)
}
