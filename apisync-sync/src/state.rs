//! Per-repository, per-environment deployment bookkeeping.
//!
//! Persists `<home>/.apisync/vcs_state.yaml`:
//!
//! ```yaml
//! repos:
//!   4f0c…:
//!     environments:
//!       production:
//!         lastAttemptedRev: 9a1b…
//!         lastSuccessfulRevs: [9a1b…, 77de…]
//!         failedProjects:
//!           api: [apis/orders]
//!         updatedAt: 2024-05-01T10:00:00Z
//! ```
//!
//! Writes use the same atomic `.tmp` + rename pattern as the config file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use apisync_core::config::{apisync_dir_at, write_atomic};
use apisync_core::types::ProjectType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{io_err, SyncError};

/// Maximum number of successful revisions remembered per environment.
pub const MAX_SUCCESSFUL_REVS: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VcsState {
    #[serde(default)]
    pub repos: BTreeMap<String, RepoState>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoState {
    #[serde(default)]
    pub environments: BTreeMap<String, EnvironmentState>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnvironmentState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_attempted_rev: Option<String>,
    pub last_successful_revs: Vec<String>,
    /// Relative roots of projects that failed in the last run, by type.
    pub failed_projects: BTreeMap<ProjectType, Vec<PathBuf>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl EnvironmentState {
    /// Record a finished run at `head`. `failed` replaces the previous
    /// failures. The revision is remembered as successful only when nothing
    /// failed.
    pub fn record_run(&mut self, head: &str, failed: BTreeMap<ProjectType, Vec<PathBuf>>) {
        self.last_attempted_rev = Some(head.to_string());
        let succeeded = failed.values().all(Vec::is_empty);
        self.failed_projects = failed.into_iter().filter(|(_, v)| !v.is_empty()).collect();
        if succeeded && self.last_successful_revs.first().map(String::as_str) != Some(head) {
            self.last_successful_revs.insert(0, head.to_string());
            self.last_successful_revs.truncate(MAX_SUCCESSFUL_REVS);
        }
        self.updated_at = Some(Utc::now());
    }

    /// Every failed root, regardless of type.
    pub fn failed_roots(&self) -> Vec<PathBuf> {
        self.failed_projects.values().flatten().cloned().collect()
    }
}

impl VcsState {
    pub fn environment(&self, repo_id: &str, env: &str) -> Option<&EnvironmentState> {
        self.repos.get(repo_id)?.environments.get(env)
    }

    pub fn environment_mut(&mut self, repo_id: &str, env: &str) -> &mut EnvironmentState {
        self.repos
            .entry(repo_id.to_string())
            .or_default()
            .environments
            .entry(env.to_string())
            .or_default()
    }
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// `<home>/.apisync/vcs_state.yaml`: pure, no I/O.
pub fn state_path_at(home: &Path) -> PathBuf {
    home.join(".apisync").join("vcs_state.yaml")
}

/// Load the state. A missing or empty file is an empty state.
pub fn load_at(home: &Path) -> Result<VcsState, SyncError> {
    let path = state_path_at(home);
    if !path.exists() {
        return Ok(VcsState::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    if contents.trim().is_empty() {
        return Ok(VcsState::default());
    }
    serde_yaml::from_str(&contents).map_err(|source| SyncError::StateParse { path, source })
}

/// Save the state atomically with mode `0600`.
pub fn save_at(home: &Path, state: &VcsState) -> Result<(), SyncError> {
    apisync_dir_at(home)?;
    let path = state_path_at(home);
    let yaml = serde_yaml::to_string(state)?;
    write_atomic(&path, &yaml).map_err(|e| io_err(&path, e))
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
