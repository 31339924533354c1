//! Error types for apisync-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a project parameter file.
#[derive(Debug, Error)]
pub enum ParamsError {
    /// The file could not be read.
    #[error("cannot read parameter file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// One or more `${VAR}` / `$VAR` references had no value. All of them are
    /// listed, in order of first appearance.
    #[error("unresolved environment variables in {path}: {}", missing.join(", "))]
    EnvSubstitution { path: PathBuf, missing: Vec<String> },

    /// Malformed YAML, a type mismatch, or a schema rule violation.
    #[error("failed to parse parameter file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Errors raised while reading or writing `~/.apisync/config.yaml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (write path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load, with the file path.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`, so `~/.apisync/` cannot be located.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}
