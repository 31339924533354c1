//! Deploying a resolved change set, one project at a time or on a small
//! worker pool.
//!
//! Classification always finishes before the first deployment starts, so
//! workers only ever read the change set. Each project's outcome is recorded
//! independently: a failure never stops its siblings.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use apisync_detector::{resolve, ChangeEntry, ChangeSet};
use tracing::{error, info, warn};

use crate::deploy::{DeployRequest, Deployer};
use crate::environment::{resolve_environment, EnvironmentOverride};
use crate::error::SyncError;
use crate::report::{ProjectOutcome, ProjectReport, SyncReport};

/// Cooperative cancellation, checked before each project starts. A project
/// that is already deploying always runs to completion.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Number of concurrent deployments. `1` keeps strict discovery order.
    pub jobs: usize,
    pub cancel: CancelFlag,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            jobs: 1,
            cancel: CancelFlag::new(),
        }
    }
}

/// Resolve `changed_paths` under `repo_root` and deploy every affected
/// project to `target_env`.
///
/// Discovery errors abort the run. Deployment errors are recorded per project.
pub fn sync(
    repo_root: &Path,
    changed_paths: &[PathBuf],
    target_env: &str,
    deployer: &dyn Deployer,
    options: &SyncOptions,
) -> Result<SyncReport, SyncError> {
    let set = resolve(repo_root, changed_paths)?;
    Ok(deploy_change_set(&set, target_env, deployer, options))
}

/// Deploy an already-resolved change set. Groups are processed in type order
/// and projects in discovery order; the report keeps that order even when
/// deploying in parallel.
pub fn deploy_change_set(
    set: &ChangeSet,
    target_env: &str,
    deployer: &dyn Deployer,
    options: &SyncOptions,
) -> SyncReport {
    if set.is_empty() {
        info!("no projects affected; nothing to deploy");
        return SyncReport::empty(target_env);
    }
    for (kind, group) in set.groups() {
        info!("{} {} to deploy to '{}'", group.len(), kind.plural(), target_env);
    }

    let entries: Vec<&ChangeEntry> = set.entries().collect();
    let jobs = options.jobs.clamp(1, entries.len());
    let projects = if jobs == 1 {
        entries
            .iter()
            .map(|entry| deploy_one(entry, target_env, deployer, &options.cancel))
            .collect()
    } else {
        deploy_parallel(&entries, jobs, target_env, deployer, &options.cancel)
    };

    SyncReport {
        environment: target_env.to_string(),
        projects,
    }
}

fn deploy_parallel(
    entries: &[&ChangeEntry],
    jobs: usize,
    target_env: &str,
    deployer: &dyn Deployer,
    cancel: &CancelFlag,
) -> Vec<ProjectReport> {
    let next = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel();
    thread::scope(|scope| {
        for _ in 0..jobs {
            let tx = tx.clone();
            let next = &next;
            scope.spawn(move || loop {
                let i = next.fetch_add(1, Ordering::SeqCst);
                let Some(entry) = entries.get(i) else { break };
                let report = deploy_one(entry, target_env, deployer, cancel);
                if tx.send((i, report)).is_err() {
                    break;
                }
            });
        }
    });
    drop(tx);

    let mut indexed: Vec<(usize, ProjectReport)> = rx.into_iter().collect();
    indexed.sort_by_key(|(i, _)| *i);
    indexed.into_iter().map(|(_, report)| report).collect()
}

fn deploy_one(
    entry: &ChangeEntry,
    target_env: &str,
    deployer: &dyn Deployer,
    cancel: &CancelFlag,
) -> ProjectReport {
    let project = &entry.project;
    let kind = project.project_type();
    let rel = project.relative_path.display();

    if cancel.is_cancelled() {
        return ProjectReport::new(entry, ProjectOutcome::Cancelled);
    }
    if !deployer.supports(kind) {
        warn!("{} projects are not supported yet; skipping {}", kind, rel);
        return ProjectReport::new(entry, ProjectOutcome::Unsupported);
    }

    let (override_, override_found) = match project.params.as_api() {
        Some(api) => match resolve_environment(api, target_env) {
            Some(env) => {
                info!("using '{}' environment params for {}", target_env, rel);
                (
                    Some(EnvironmentOverride::for_project(env, &project.base_path)),
                    Some(true),
                )
            }
            None => {
                info!(
                    "no '{}' environment params for {}; deploying with defaults",
                    target_env, rel
                );
                (None, Some(false))
            }
        },
        None => (None, None),
    };

    let request = DeployRequest {
        project,
        environment: target_env,
        override_,
    };
    let outcome = match deployer.deploy(&request) {
        Ok(()) => {
            info!("deployed {} to '{}'", rel, target_env);
            ProjectOutcome::Deployed
        }
        Err(e) => {
            error!("failed to deploy {}: {}", rel, e);
            ProjectOutcome::Failed {
                error: e.to_string(),
            }
        }
    };

    let mut report = ProjectReport::new(entry, outcome);
    report.override_found = override_found;
    report
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeployError;
    use apisync_core::types::ProjectType;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Records every call and fails for the configured project names.
    #[derive(Default)]
    struct StubDeployer {
        fail: Vec<String>,
        calls: Mutex<Vec<(String, Option<String>)>>,
        cancel_after_first: Option<CancelFlag>,
    }

    impl Deployer for StubDeployer {
        fn deploy(&self, request: &DeployRequest<'_>) -> Result<(), DeployError> {
            let name = request.project.name.to_string();
            self.calls.lock().unwrap().push((
                name.clone(),
                request.override_.as_ref().map(|o| o.name.clone()),
            ));
            if let Some(flag) = &self.cancel_after_first {
                flag.cancel();
            }
            if self.fail.contains(&name) {
                Err(DeployError::Rejected(format!("{name} rejected")))
            } else {
                Ok(())
            }
        }
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn three_api_repo() -> TempDir {
        let repo = TempDir::new().unwrap();
        write(repo.path(), "apis/one/api_params.yaml", "environments:\n  - name: dev\n");
        write(repo.path(), "apis/two/api_params.yaml", "environments:\n  - name: prod\n");
        write(repo.path(), "apis/three/api_params.yaml", "");
        repo
    }

    fn changed() -> Vec<PathBuf> {
        ["apis/one/a.yaml", "apis/two/a.yaml", "apis/three/a.yaml"]
            .iter()
            .map(PathBuf::from)
            .collect()
    }

    #[test]
    fn empty_change_never_calls_deployer() {
        let repo = three_api_repo();
        let stub = StubDeployer::default();
        let report = sync(repo.path(), &[], "dev", &stub, &SyncOptions::default()).unwrap();
        assert!(report.nothing_to_do());
        assert_eq!(report.total(), 0);
        assert!(stub.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn failure_of_second_project_does_not_stop_the_third() {
        let repo = three_api_repo();
        let stub = StubDeployer {
            fail: vec!["two".into()],
            ..StubDeployer::default()
        };
        let report = sync(repo.path(), &changed(), "dev", &stub, &SyncOptions::default()).unwrap();

        let calls: Vec<String> = stub.calls.lock().unwrap().iter().map(|c| c.0.clone()).collect();
        assert_eq!(calls, vec!["one", "two", "three"]);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.projects[0].outcome, ProjectOutcome::Deployed);
        assert!(matches!(report.projects[1].outcome, ProjectOutcome::Failed { .. }));
        assert_eq!(report.projects[2].outcome, ProjectOutcome::Deployed);
    }

    #[test]
    fn override_is_passed_only_when_environment_exists() {
        let repo = three_api_repo();
        let stub = StubDeployer::default();
        let report = sync(repo.path(), &changed(), "dev", &stub, &SyncOptions::default()).unwrap();

        let calls = stub.calls.lock().unwrap().clone();
        assert_eq!(calls[0], ("one".to_string(), Some("dev".to_string())));
        assert_eq!(calls[1], ("two".to_string(), None));
        assert_eq!(report.projects[0].override_found, Some(true));
        assert_eq!(report.projects[1].override_found, Some(false));
    }

    #[test]
    fn unsupported_types_are_reported_not_dropped() {
        let repo = three_api_repo();
        write(repo.path(), "apps/shop/application_params.yaml", "");
        let stub = StubDeployer::default();
        let mut paths = changed();
        paths.push(PathBuf::from("apps/shop/x.yaml"));

        let report = sync(repo.path(), &paths, "dev", &stub, &SyncOptions::default()).unwrap();

        assert_eq!(report.total(), 4);
        assert_eq!(report.unsupported(), 1);
        let last = report.projects.last().unwrap();
        assert_eq!(last.project_type, ProjectType::Application);
        assert_eq!(last.outcome, ProjectOutcome::Unsupported);
        assert_eq!(stub.calls.lock().unwrap().len(), 3);
        assert!(report.is_success());
    }

    #[test]
    fn cancellation_stops_before_the_next_project() {
        let repo = three_api_repo();
        let cancel = CancelFlag::new();
        let stub = StubDeployer {
            cancel_after_first: Some(cancel.clone()),
            ..StubDeployer::default()
        };
        let options = SyncOptions { jobs: 1, cancel };
        let report = sync(repo.path(), &changed(), "dev", &stub, &options).unwrap();

        assert_eq!(stub.calls.lock().unwrap().len(), 1);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.cancelled(), 2);
        assert!(!report.is_success());
    }

    #[test]
    fn parallel_run_keeps_discovery_order() {
        let repo = three_api_repo();
        let stub = StubDeployer {
            fail: vec!["two".into()],
            ..StubDeployer::default()
        };
        let options = SyncOptions {
            jobs: 3,
            ..SyncOptions::default()
        };
        let report = sync(repo.path(), &changed(), "dev", &stub, &options).unwrap();

        let names: Vec<&str> = report.projects.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["one", "two", "three"]);
        assert_eq!(report.failed(), 1);
        assert_eq!(stub.calls.lock().unwrap().len(), 3);
    }

    #[test]
    fn discovery_errors_abort_before_any_deploy() {
        let repo = three_api_repo();
        write(repo.path(), "apis/bad/api_params.yaml", "environments: [\n");
        let stub = StubDeployer::default();
        let mut paths = changed();
        paths.push(PathBuf::from("apis/bad/x.yaml"));

        let err = sync(repo.path(), &paths, "dev", &stub, &SyncOptions::default()).unwrap_err();
        assert!(matches!(err, SyncError::Detect(_)), "got: {err}");
        assert!(stub.calls.lock().unwrap().is_empty());
    }
}
