//! Error types for apisync-sync.

use std::path::PathBuf;

use apisync_core::ConfigError;
use apisync_detector::DetectError;
use thiserror::Error;

/// Fatal errors for a whole synchronization run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Project discovery failed: unreadable directory or bad parameter file.
    #[error(transparent)]
    Detect(#[from] DetectError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (state and repo id writes).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to parse {path}: {source}")]
    StateParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{path} not found; run `apisync init` in the repository root first")]
    RepoNotInitialized { path: PathBuf },

    #[error("{path} already exists; use --force to replace it")]
    AlreadyInitialized { path: PathBuf },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

/// Failure of a single project's deployment. Recorded in the report; never
/// aborts the run.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while running `{program}`: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot encode deploy request: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("`{program}` exited with {status}{}", stderr_suffix(.stderr))]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("`{program}` timed out after {secs}s")]
    TimedOut { program: String, secs: u64 },

    /// The deployer refused the project for a reason of its own.
    #[error("{0}")]
    Rejected(String),
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}
