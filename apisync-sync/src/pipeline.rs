//! Shared deploy pipeline used by `apisync status` and `apisync deploy`.
//!
//! Changed paths come from the caller. The pipeline adds the projects that
//! failed last time for the same environment, deploys the change set, and
//! records the outcome in the VCS state file.

use std::path::{Path, PathBuf};

use apisync_detector::{requeue_failed, resolve_with, ChangeSet, Classifier};
use tracing::info;

use crate::deploy::Deployer;
use crate::error::SyncError;
use crate::orchestrator::{deploy_change_set, SyncOptions};
use crate::report::SyncReport;
use crate::{repo_info, state};

/// Where a pipeline run reads and writes.
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    /// Directory holding `.apisync/`.
    pub home: &'a Path,
    pub repo_root: &'a Path,
    pub environment: &'a str,
}

/// The resolved work for one run.
#[derive(Debug, Clone)]
pub struct Plan {
    pub repo_id: String,
    pub change_set: ChangeSet,
    /// Number of previously failed projects added back to the set.
    pub requeued: usize,
}

/// The revision the diff for `target` should start from, if any run has been
/// recorded for this repository and environment.
pub fn since_revision(target: Target<'_>) -> Result<Option<String>, SyncError> {
    let info = repo_info::load(target.repo_root)?;
    let state = state::load_at(target.home)?;
    Ok(state
        .environment(&info.id, target.environment)
        .and_then(|env| env.last_attempted_rev.clone()))
}

/// Resolve `changed_paths` and re-queue the last run's failures.
pub fn plan(target: Target<'_>, changed_paths: &[PathBuf]) -> Result<Plan, SyncError> {
    let info = repo_info::load(target.repo_root)?;
    let state = state::load_at(target.home)?;
    let failed = state
        .environment(&info.id, target.environment)
        .map(|env| env.failed_roots())
        .unwrap_or_default();

    let mut classifier = Classifier::new(target.repo_root);
    let mut change_set = resolve_with(&mut classifier, changed_paths)?;
    let requeued = requeue_failed(&mut classifier, &mut change_set, &failed)?;
    if requeued > 0 {
        info!("retrying {} previously failed project(s)", requeued);
    }

    Ok(Plan {
        repo_id: info.id,
        change_set,
        requeued,
    })
}

/// Plan, deploy, and (when `head` is given) record the run against `head`.
///
/// Dry runs pass `head = None` so the state file is left untouched.
pub fn run(
    target: Target<'_>,
    changed_paths: &[PathBuf],
    head: Option<&str>,
    deployer: &dyn Deployer,
    options: &SyncOptions,
) -> Result<SyncReport, SyncError> {
    let plan = plan(target, changed_paths)?;
    let report = deploy_change_set(&plan.change_set, target.environment, deployer, options);

    if let Some(head) = head {
        let mut vcs_state = state::load_at(target.home)?;
        vcs_state
            .environment_mut(&plan.repo_id, target.environment)
            .record_run(head, report.retry_roots());
        state::save_at(target.home, &vcs_state)?;
    }
    Ok(report)
}
