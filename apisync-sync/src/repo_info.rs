//! Repository identity stored in `vcs.yaml` at the repository root.
//!
//! The id keys this repository's entry in the VCS state file, so it must stay
//! stable across clones and renames of the working directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{io_err, SyncError};

pub const REPO_INFO_FILE: &str = "vcs.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoInfo {
    pub id: String,
}

/// `<repo_root>/vcs.yaml`: pure, no I/O.
pub fn repo_info_path(repo_root: &Path) -> PathBuf {
    repo_root.join(REPO_INFO_FILE)
}

/// Write a fresh id for the repository. An existing `vcs.yaml` is only
/// replaced when `force` is set.
pub fn init(repo_root: &Path, force: bool) -> Result<RepoInfo, SyncError> {
    let path = repo_info_path(repo_root);
    if path.exists() && !force {
        return Err(SyncError::AlreadyInitialized { path });
    }
    let info = RepoInfo {
        id: Uuid::new_v4().to_string(),
    };
    let yaml = serde_yaml::to_string(&info)?;
    std::fs::write(&path, yaml).map_err(|e| io_err(&path, e))?;
    Ok(info)
}

/// Read the repository id, failing with [`SyncError::RepoNotInitialized`]
/// when `vcs.yaml` is absent.
pub fn load(repo_root: &Path) -> Result<RepoInfo, SyncError> {
    let path = repo_info_path(repo_root);
    if !path.exists() {
        return Err(SyncError::RepoNotInitialized { path });
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    serde_yaml::from_str(&contents).map_err(|source| SyncError::StateParse { path, source })
}
