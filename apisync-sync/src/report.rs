//! Per-run deployment report.

use std::collections::BTreeMap;
use std::path::PathBuf;

use apisync_core::types::ProjectType;
use apisync_detector::{ChangeEntry, Origin};
use serde::Serialize;

/// What happened to one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProjectOutcome {
    Deployed,
    Failed { error: String },
    /// The deployer cannot handle this project type.
    Unsupported,
    /// The run was interrupted before this project started.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectReport {
    pub name: String,
    pub project_type: ProjectType,
    pub relative_path: PathBuf,
    pub base_path: PathBuf,
    pub origin: Origin,
    /// For API projects: whether the target environment was declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_found: Option<bool>,
    #[serde(flatten)]
    pub outcome: ProjectOutcome,
}

impl ProjectReport {
    pub(crate) fn new(entry: &ChangeEntry, outcome: ProjectOutcome) -> Self {
        let project = &entry.project;
        Self {
            name: project.name.to_string(),
            project_type: project.project_type(),
            relative_path: project.relative_path.clone(),
            base_path: project.base_path.clone(),
            origin: entry.origin,
            override_found: None,
            outcome,
        }
    }
}

/// Outcome of one synchronization run, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub environment: String,
    pub projects: Vec<ProjectReport>,
}

impl SyncReport {
    pub fn empty(environment: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            projects: Vec::new(),
        }
    }

    pub fn total(&self) -> usize {
        self.projects.len()
    }

    pub fn succeeded(&self) -> usize {
        self.count(|o| matches!(o, ProjectOutcome::Deployed))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ProjectOutcome::Failed { .. }))
    }

    pub fn unsupported(&self) -> usize {
        self.count(|o| matches!(o, ProjectOutcome::Unsupported))
    }

    pub fn cancelled(&self) -> usize {
        self.count(|o| matches!(o, ProjectOutcome::Cancelled))
    }

    /// No project was affected by the change.
    pub fn nothing_to_do(&self) -> bool {
        self.projects.is_empty()
    }

    /// Nothing failed and nothing was cancelled. Unsupported projects do not
    /// count against success.
    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.cancelled() == 0
    }

    /// Relative roots of projects that must be retried next run (failed or
    /// cancelled), grouped by type.
    pub fn retry_roots(&self) -> BTreeMap<ProjectType, Vec<PathBuf>> {
        let mut roots: BTreeMap<ProjectType, Vec<PathBuf>> = BTreeMap::new();
        for p in &self.projects {
            if matches!(
                p.outcome,
                ProjectOutcome::Failed { .. } | ProjectOutcome::Cancelled
            ) {
                roots
                    .entry(p.project_type)
                    .or_default()
                    .push(p.relative_path.clone());
            }
        }
        roots
    }

    fn count(&self, pred: impl Fn(&ProjectOutcome) -> bool) -> usize {
        self.projects.iter().filter(|p| pred(&p.outcome)).count()
    }
}
