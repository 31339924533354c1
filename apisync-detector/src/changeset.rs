//! Mapping changed file paths to the deduplicated set of owning projects.

use std::collections::{BTreeMap, HashSet};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use apisync_core::types::{ProjectParams, ProjectType};
use serde::Serialize;
use tracing::{debug, warn};

use crate::classifier::{Classifier, ProjectFs};
use crate::DetectError;

// ---------------------------------------------------------------------------
// Change set
// ---------------------------------------------------------------------------

/// Why a project is in the change set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// A file under the project changed.
    Diff,
    /// The project failed in an earlier run and is being retried.
    PreviouslyFailed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEntry {
    pub project: Arc<ProjectParams>,
    pub origin: Origin,
}

/// Projects grouped by type. Each group keeps discovery order and each
/// `base_path` appears at most once across the whole set.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    groups: BTreeMap<ProjectType, Vec<ChangeEntry>>,
    seen: HashSet<PathBuf>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `project` unless its base path is already present. Returns whether
    /// it was added.
    pub fn insert(&mut self, project: Arc<ProjectParams>, origin: Origin) -> bool {
        if !self.seen.insert(project.base_path.clone()) {
            return false;
        }
        self.groups
            .entry(project.project_type())
            .or_default()
            .push(ChangeEntry { project, origin });
        true
    }

    pub fn contains(&self, base_path: &Path) -> bool {
        self.seen.contains(base_path)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// The projects of one type, in discovery order.
    pub fn group(&self, kind: ProjectType) -> &[ChangeEntry] {
        self.groups.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Non-empty groups in [`ProjectType`] order.
    pub fn groups(&self) -> impl Iterator<Item = (ProjectType, &[ChangeEntry])> {
        self.groups
            .iter()
            .filter(|(_, entries)| !entries.is_empty())
            .map(|(kind, entries)| (*kind, entries.as_slice()))
    }

    /// Every entry, grouped by type and then in discovery order.
    pub fn entries(&self) -> impl Iterator<Item = &ChangeEntry> {
        self.groups.values().flatten()
    }
}

// ---------------------------------------------------------------------------
// Path handling
// ---------------------------------------------------------------------------

/// Split newline-delimited diff output into paths, dropping blank lines
/// (including the trailing one) and stray `\r`.
pub fn parse_changed_paths(text: &str) -> Vec<PathBuf> {
    text.lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .map(PathBuf::from)
        .collect()
}

/// The directories that could own `file`: `repo_root`, then each ancestor of
/// `file` from shallowest to deepest, ending at its parent directory.
///
/// Returns `None` for a path that is absolute or climbs out with `..`.
pub fn sub_paths(repo_root: &Path, file: &Path) -> Option<Vec<PathBuf>> {
    dir_chain(repo_root, file.parent().unwrap_or_else(|| Path::new("")))
}

/// `repo_root` followed by each prefix of the relative directory `dir`.
fn dir_chain(repo_root: &Path, dir: &Path) -> Option<Vec<PathBuf>> {
    let mut dirs = vec![repo_root.to_path_buf()];
    let mut current = repo_root.to_path_buf();
    for component in dir.components() {
        match component {
            Component::Normal(segment) => {
                current.push(segment);
                dirs.push(current.clone());
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(dirs)
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolve `changed_paths` (relative to `repo_root`) with a fresh classifier.
pub fn resolve(repo_root: &Path, changed_paths: &[PathBuf]) -> Result<ChangeSet, DetectError> {
    let mut classifier = Classifier::new(repo_root);
    resolve_with(&mut classifier, changed_paths)
}

/// Resolve `changed_paths` through an existing classifier, so its cache can
/// be reused or inspected afterwards.
pub fn resolve_with<F: ProjectFs>(
    classifier: &mut Classifier<F>,
    changed_paths: &[PathBuf],
) -> Result<ChangeSet, DetectError> {
    let mut set = ChangeSet::new();
    for path in changed_paths {
        if path.as_os_str().is_empty() {
            continue;
        }
        let Some(dirs) = sub_paths(classifier.repo_root(), path) else {
            warn!("ignoring changed path outside the repository: {}", path.display());
            continue;
        };
        match owning_project(classifier, &dirs)? {
            Some(project) => {
                if set.insert(project, Origin::Diff) {
                    debug!("{} belongs to a newly found project", path.display());
                }
            }
            None => debug!("no project owns {}", path.display()),
        }
    }
    Ok(set)
}

/// Re-queue project roots that failed in an earlier run. Roots already in
/// `set` are left alone; roots that no longer exist or are no longer projects
/// are dropped with a warning. Returns how many were added.
pub fn requeue_failed<F: ProjectFs>(
    classifier: &mut Classifier<F>,
    set: &mut ChangeSet,
    relative_roots: &[PathBuf],
) -> Result<usize, DetectError> {
    let mut added = 0;
    for rel in relative_roots {
        let Some(dirs) = dir_chain(classifier.repo_root(), rel) else {
            warn!("ignoring failed project path outside the repository: {}", rel.display());
            continue;
        };
        let Some(dir) = dirs.last() else { continue };
        if set.contains(dir) {
            debug!("{} is already scheduled", rel.display());
            continue;
        }
        if !classifier.is_dir(dir) {
            warn!("previously failed project no longer exists: {}", rel.display());
            continue;
        }
        match classifier.classify(dir)? {
            Some(project) => {
                if set.insert(project, Origin::PreviouslyFailed) {
                    added += 1;
                }
            }
            None => warn!("previously failed path is no longer a project: {}", rel.display()),
        }
    }
    Ok(added)
}

fn owning_project<F: ProjectFs>(
    classifier: &mut Classifier<F>,
    dirs: &[PathBuf],
) -> Result<Option<Arc<ProjectParams>>, DetectError> {
    for dir in dirs {
        if let Some(project) = classifier.classify(dir)? {
            return Ok(Some(project));
        }
    }
    Ok(None)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
