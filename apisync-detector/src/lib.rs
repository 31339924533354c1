//! Project discovery for `apisync-detector`.
//!
//! [`classifier`] decides whether a directory is a project root by looking for
//! a marker parameter file. [`changeset`] walks the ancestors of each changed
//! file through a classifier and collects the owning projects, deduplicated
//! and grouped by type.

use std::path::PathBuf;

use apisync_core::ParamsError;
use thiserror::Error;

pub mod changeset;
pub mod classifier;

pub use changeset::{
    parse_changed_paths, requeue_failed, resolve, resolve_with, sub_paths, ChangeEntry, ChangeSet,
    Origin,
};
pub use classifier::{Classifier, OsFs, PathInfoCache, ProjectFs, VarLookup};

/// Fatal discovery errors. Any of them aborts the whole run.
#[derive(Debug, Error)]
pub enum DetectError {
    /// A directory on the walk could not be listed.
    #[error("cannot read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Params(#[from] ParamsError),
}
