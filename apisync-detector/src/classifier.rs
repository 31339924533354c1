//! Directory classification with a per-run memo cache.
//!
//! A directory is a project root when it directly contains one of the marker
//! files. Markers are checked in [`ProjectType`] order, so a directory holding
//! both `api_params.yaml` and `application_params.yaml` is an API project.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use apisync_core::loader::parse_params;
use apisync_core::types::{ProjectName, ProjectParams, ProjectType};
use apisync_core::ParamsError;
use tracing::debug;

use crate::DetectError;

/// Classification result for every directory visited in one run. `None`
/// records a directory that is not a project root.
pub type PathInfoCache = HashMap<PathBuf, Option<Arc<ProjectParams>>>;

/// Resolves a variable name to its value during parameter substitution.
pub type VarLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

// ---------------------------------------------------------------------------
// Filesystem seam
// ---------------------------------------------------------------------------

/// The filesystem operations classification needs.
pub trait ProjectFs {
    /// Names of the regular files directly inside `dir`.
    fn list_files(&self, dir: &Path) -> io::Result<HashSet<String>>;

    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    fn is_dir(&self, path: &Path) -> bool;
}

/// [`ProjectFs`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFs;

impl ProjectFs for OsFs {
    fn list_files(&self, dir: &Path) -> io::Result<HashSet<String>> {
        let mut names = HashSet::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            // file_type() does not follow symlinks; metadata() does.
            let is_file = match entry.file_type() {
                Ok(t) if t.is_symlink() => entry.path().is_file(),
                Ok(t) => t.is_file(),
                Err(_) => false,
            };
            if is_file {
                names.insert(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(names)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Classifies directories under one repository root, memoizing every answer.
///
/// A `Classifier` lives for exactly one resolution run. Nothing is shared
/// between runs.
pub struct Classifier<F: ProjectFs = OsFs> {
    fs: F,
    repo_root: PathBuf,
    lookup: VarLookup,
    cache: PathInfoCache,
}

impl Classifier<OsFs> {
    /// A classifier over the real filesystem, substituting from the process
    /// environment.
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self::with_fs(repo_root, OsFs)
    }
}

impl<F: ProjectFs> Classifier<F> {
    pub fn with_fs(repo_root: impl Into<PathBuf>, fs: F) -> Self {
        Self {
            fs,
            repo_root: repo_root.into(),
            lookup: Arc::new(|name| std::env::var(name).ok()),
            cache: PathInfoCache::new(),
        }
    }

    /// Replace the variable source used for `${VAR}` substitution.
    pub fn with_lookup(mut self, lookup: VarLookup) -> Self {
        self.lookup = lookup;
        self
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    /// Whether `dir` exists as a directory. Not cached.
    pub fn is_dir(&self, dir: &Path) -> bool {
        self.fs.is_dir(dir)
    }

    /// Classify `dir`, which must be an absolute path under the repository root.
    ///
    /// A cached answer is returned without touching the filesystem. An
    /// unreadable directory and a malformed parameter file are both fatal.
    pub fn classify(&mut self, dir: &Path) -> Result<Option<Arc<ProjectParams>>, DetectError> {
        if let Some(hit) = self.cache.get(dir) {
            debug!("cache hit: {}", dir.display());
            return Ok(hit.clone());
        }

        let files = self
            .fs
            .list_files(dir)
            .map_err(|source| DetectError::DirectoryRead {
                path: dir.to_path_buf(),
                source,
            })?;

        let marker = ProjectType::all()
            .iter()
            .copied()
            .find(|kind| files.contains(kind.marker_file()));

        let result = match marker {
            Some(kind) => Some(Arc::new(self.load(dir, kind)?)),
            None => None,
        };
        if let Some(project) = &result {
            debug!("{} project root: {}", project.project_type(), dir.display());
        }

        self.cache.insert(dir.to_path_buf(), result.clone());
        Ok(result)
    }

    fn load(&self, dir: &Path, kind: ProjectType) -> Result<ProjectParams, DetectError> {
        let path = dir.join(kind.marker_file());
        let text = self
            .fs
            .read_to_string(&path)
            .map_err(|source| ParamsError::Io {
                path: path.clone(),
                source,
            })?;
        let params = parse_params(&path, &text, kind, |name| (self.lookup)(name))?;

        let relative_path = dir
            .strip_prefix(&self.repo_root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| dir.to_path_buf());
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.display().to_string());

        Ok(ProjectParams {
            name: ProjectName::from(name),
            base_path: dir.to_path_buf(),
            relative_path,
            params,
        })
    }

    /// Every directory classified so far.
    pub fn cache(&self) -> &PathInfoCache {
        &self.cache
    }

    /// Finish the run and hand the cache out for read-only use.
    pub fn into_cache(self) -> PathInfoCache {
        self.cache
    }
}

impl<F: ProjectFs> fmt::Debug for Classifier<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Classifier")
            .field("repo_root", &self.repo_root)
            .field("cached", &self.cache.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Counts every filesystem call made through it.
    #[derive(Default)]
    struct CountingFs {
        lists: AtomicUsize,
        reads: AtomicUsize,
        dir_checks: AtomicUsize,
    }

    impl ProjectFs for &CountingFs {
        fn list_files(&self, dir: &Path) -> io::Result<HashSet<String>> {
            self.lists.fetch_add(1, Ordering::SeqCst);
            OsFs.list_files(dir)
        }

        fn read_to_string(&self, path: &Path) -> io::Result<String> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            OsFs.read_to_string(path)
        }

        fn is_dir(&self, path: &Path) -> bool {
            self.dir_checks.fetch_add(1, Ordering::SeqCst);
            OsFs.is_dir(path)
        }
    }

    fn touch(dir: &Path, name: &str, contents: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn second_classification_is_served_from_cache() {
        let repo = TempDir::new().unwrap();
        let orders = repo.path().join("orders");
        touch(&orders, "api_params.yaml", "environments:\n  - name: dev\n");

        let counting = CountingFs::default();
        let mut classifier = Classifier::with_fs(repo.path(), &counting);

        let first = classifier.classify(&orders).unwrap().expect("project");
        let second = classifier.classify(&orders).unwrap().expect("project");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(counting.lists.load(Ordering::SeqCst), 1);
        assert_eq!(counting.reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn non_project_answer_is_cached_too() {
        let repo = TempDir::new().unwrap();
        let docs = repo.path().join("docs");
        touch(&docs, "README.md", "hi");

        let counting = CountingFs::default();
        let mut classifier = Classifier::with_fs(repo.path(), &counting);
        assert!(classifier.classify(&docs).unwrap().is_none());
        assert!(classifier.classify(&docs).unwrap().is_none());
        assert_eq!(counting.lists.load(Ordering::SeqCst), 1);
        assert_eq!(classifier.cache().get(&docs), Some(&None));
    }

    #[test]
    fn api_marker_wins_over_application_marker() {
        let repo = TempDir::new().unwrap();
        let dir = repo.path().join("mixed");
        touch(&dir, "application_params.yaml", "");
        touch(&dir, "api_params.yaml", "");

        let mut classifier = Classifier::new(repo.path());
        let project = classifier.classify(&dir).unwrap().expect("project");
        assert_eq!(project.project_type(), ProjectType::Api);
        assert_eq!(project.relative_path, PathBuf::from("mixed"));
        assert_eq!(project.name.to_string(), "mixed");
    }

    #[test]
    fn marker_directory_is_not_a_marker() {
        let repo = TempDir::new().unwrap();
        let dir = repo.path().join("odd");
        fs::create_dir_all(dir.join("api_params.yaml")).unwrap();

        let mut classifier = Classifier::new(repo.path());
        assert!(classifier.classify(&dir).unwrap().is_none());
    }

    #[test]
    fn missing_directory_is_fatal() {
        let repo = TempDir::new().unwrap();
        let mut classifier = Classifier::new(repo.path());
        let err = classifier.classify(&repo.path().join("gone")).unwrap_err();
        assert!(matches!(err, DetectError::DirectoryRead { .. }), "got: {err}");
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn substitution_uses_injected_lookup() {
        let repo = TempDir::new().unwrap();
        let dir = repo.path().join("svc");
        touch(
            &dir,
            "api_params.yaml",
            "environments:\n  - name: dev\n    endpoints:\n      production:\n        url: ${BACKEND}\n",
        );

        let mut classifier = Classifier::new(repo.path()).with_lookup(Arc::new(|name: &str| {
            (name == "BACKEND").then(|| "http://backend".to_string())
        }));
        let project = classifier.classify(&dir).unwrap().expect("project");
        let env = project.params.as_api().unwrap().environment("dev").unwrap();
        assert_eq!(
            env.strategy.as_ref().unwrap().production_urls(),
            vec!["http://backend"]
        );
    }

    #[test]
    fn requeue_checks_existence_through_the_seam() {
        use crate::changeset::{requeue_failed, ChangeSet};

        let repo = TempDir::new().unwrap();
        touch(&repo.path().join("orders"), "api_params.yaml", "");

        let counting = CountingFs::default();
        let mut classifier = Classifier::with_fs(repo.path(), &counting);
        let mut set = ChangeSet::new();
        let added = requeue_failed(
            &mut classifier,
            &mut set,
            &[PathBuf::from("orders"), PathBuf::from("gone")],
        )
        .unwrap();

        assert_eq!(added, 1);
        assert_eq!(counting.dir_checks.load(Ordering::SeqCst), 2);
        // The missing root is dropped before it is listed.
        assert_eq!(counting.lists.load(Ordering::SeqCst), 1);
    }
}
