//! Error types for the event-audit crate.

use std::path::PathBuf;

/// Errors that abort an audit run.
///
/// Search failures are deliberately absent: a failed search is reported as
/// [`SearchOutcome::Failed`](crate::scan::SearchOutcome::Failed) and never
/// stops the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Derived configuration is unusable (e.g. a URL with no repository name).
    #[error("configuration error: {0}")]
    Config(String),

    /// `git clone` could not be started or exited unsuccessfully.
    #[error("failed to clone {url}: {reason}")]
    Clone { url: String, reason: String },

    /// Failed to read a file or list a directory.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to remove the cloned repository.
    #[error("failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A spec file is not well-formed YAML or JSON.
    #[error("failed to parse {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// A spec file parsed but is not a valid OpenAPI document.
    #[error("invalid OpenAPI document {path}: {reason}")]
    InvalidSpec { path: PathBuf, reason: String },

    /// A document has no `components.schemas` mapping to extract events from.
    #[error("{path} has no components.schemas mapping")]
    MissingSchemas { path: PathBuf },

    /// Async runtime or task failure.
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl Error {
    pub(crate) fn invalid_spec(path: &std::path::Path, reason: impl Into<String>) -> Self {
        Error::InvalidSpec {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
