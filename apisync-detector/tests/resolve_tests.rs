//! Change-set resolution over real directory trees.
//!
//! Each test builds its own `TempDir` repository, so no state is shared.

use apisync_core::types::ProjectType;
use apisync_detector::{
    requeue_failed, resolve, resolve_with, Classifier, DetectError, Origin,
};
use rstest::rstest;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_repo() -> TempDir {
    TempDir::new().expect("tempdir")
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, content).expect("write fixture");
}

fn paths(list: &[&str]) -> Vec<PathBuf> {
    list.iter().map(PathBuf::from).collect()
}

/// `/repo/apis/orders` (API), `/repo/apis/payments` (API),
/// `/repo/products/gold` (API Product), `/repo/apps/billing` (no marker).
fn sample_repo() -> TempDir {
    let repo = make_repo();
    let root = repo.path();
    write(root, "README.md", "docs");
    write(root, "apis/orders/api_params.yaml", "environments:\n  - name: dev\n");
    write(root, "apis/orders/swagger.yaml", "openapi: 3.0.0\n");
    write(root, "apis/orders/deployment/v1.json", "{}");
    write(root, "apis/payments/api_params.yaml", "");
    write(root, "apis/payments/Definitions/swagger.yaml", "");
    write(root, "products/gold/api_product_params.yaml", "");
    write(root, "products/gold/meta.yaml", "");
    write(root, "apps/billing/app.yaml", "");
    repo
}

// ---------------------------------------------------------------------------
// 1. Resolution
// ---------------------------------------------------------------------------

#[test]
fn example_scenario_yields_one_api_project() {
    let repo = sample_repo();
    let changed = paths(&[
        "apis/orders/swagger.yaml",
        "apis/orders/deployment/v1.json",
        "apps/billing/app.yaml",
    ]);

    let set = resolve(repo.path(), &changed).expect("resolve");

    assert_eq!(set.len(), 1);
    let apis = set.group(ProjectType::Api);
    assert_eq!(apis.len(), 1);
    assert_eq!(apis[0].project.base_path, repo.path().join("apis/orders"));
    assert_eq!(apis[0].project.relative_path, PathBuf::from("apis/orders"));
    assert_eq!(apis[0].origin, Origin::Diff);
    assert!(set.group(ProjectType::Application).is_empty());
}

#[test]
fn projects_are_grouped_and_keep_discovery_order() {
    let repo = sample_repo();
    let changed = paths(&[
        "products/gold/meta.yaml",
        "apis/payments/Definitions/swagger.yaml",
        "apis/orders/swagger.yaml",
        "apis/payments/api_params.yaml",
    ]);

    let set = resolve(repo.path(), &changed).expect("resolve");

    let kinds: Vec<ProjectType> = set.groups().map(|(kind, _)| kind).collect();
    assert_eq!(kinds, vec![ProjectType::Api, ProjectType::ApiProduct]);
    let api_names: Vec<String> = set
        .group(ProjectType::Api)
        .iter()
        .map(|e| e.project.name.to_string())
        .collect();
    assert_eq!(api_names, vec!["payments", "orders"]);
    assert_eq!(set.entries().count(), 3);
}

#[rstest]
#[case::same_file_twice(&["apis/orders/swagger.yaml", "apis/orders/swagger.yaml"])]
#[case::sibling_files(&["apis/orders/swagger.yaml", "apis/orders/api_params.yaml"])]
#[case::nested_file(&["apis/orders/deployment/v1.json", "apis/orders/swagger.yaml"])]
fn shared_ancestor_is_recorded_once(#[case] changed: &[&str]) {
    let repo = sample_repo();
    let set = resolve(repo.path(), &paths(changed)).expect("resolve");
    assert_eq!(set.len(), 1);
    assert_eq!(set.group(ProjectType::Api).len(), 1);
}

#[test]
fn resolution_is_idempotent() {
    let repo = sample_repo();
    let changed = paths(&[
        "apis/payments/Definitions/swagger.yaml",
        "products/gold/meta.yaml",
        "apis/orders/deployment/v1.json",
    ]);

    let first = resolve(repo.path(), &changed).expect("first");
    let second = resolve(repo.path(), &changed).expect("second");

    let bases = |set: &apisync_detector::ChangeSet| -> Vec<PathBuf> {
        set.entries().map(|e| e.project.base_path.clone()).collect()
    };
    assert_eq!(bases(&first), bases(&second));
}

#[test]
fn trailing_empty_entry_is_ignored() {
    let repo = sample_repo();
    let changed = paths(&["apis/orders/swagger.yaml", ""]);
    let set = resolve(repo.path(), &changed).expect("resolve");
    assert_eq!(set.len(), 1);
}

#[test]
fn noise_only_changes_resolve_to_nothing() {
    let repo = sample_repo();
    let set = resolve(repo.path(), &paths(&["README.md", "apps/billing/app.yaml"])).expect("resolve");
    assert!(set.is_empty());
}

#[test]
fn api_marker_beats_application_marker() {
    let repo = make_repo();
    write(repo.path(), "svc/application_params.yaml", "");
    write(repo.path(), "svc/api_params.yaml", "");
    write(repo.path(), "svc/file.txt", "");

    let set = resolve(repo.path(), &paths(&["svc/file.txt"])).expect("resolve");
    assert_eq!(set.group(ProjectType::Api).len(), 1);
    assert!(set.group(ProjectType::Application).is_empty());
}

#[test]
fn shallowest_project_root_owns_the_file() {
    let repo = make_repo();
    write(repo.path(), "outer/api_params.yaml", "");
    write(repo.path(), "outer/inner/application_params.yaml", "");
    write(repo.path(), "outer/inner/x.yaml", "");

    let set = resolve(repo.path(), &paths(&["outer/inner/x.yaml"])).expect("resolve");
    let apis = set.group(ProjectType::Api);
    assert_eq!(apis.len(), 1);
    assert_eq!(apis[0].project.relative_path, PathBuf::from("outer"));
}

// ---------------------------------------------------------------------------
// 2. Fatal errors
// ---------------------------------------------------------------------------

#[test]
fn malformed_params_abort_the_run() {
    let repo = sample_repo();
    write(repo.path(), "apis/broken/api_params.yaml", "environments: [oops\n");
    write(repo.path(), "apis/broken/swagger.yaml", "");

    let err = resolve(repo.path(), &paths(&["apis/orders/swagger.yaml", "apis/broken/swagger.yaml"]))
        .unwrap_err();
    assert!(matches!(err, DetectError::Params(_)), "got: {err}");
    assert!(err.to_string().contains("broken"), "got: {err}");
}

#[test]
fn missing_directory_aborts_the_run() {
    let repo = sample_repo();
    let err = resolve(repo.path(), &paths(&["apis/deleted/swagger.yaml"])).unwrap_err();
    assert!(matches!(err, DetectError::DirectoryRead { .. }), "got: {err}");
    assert!(err.to_string().contains("deleted"), "got: {err}");
}

#[test]
fn paths_escaping_the_repository_are_skipped() {
    let repo = sample_repo();
    let set = resolve(repo.path(), &paths(&["../elsewhere/api_params.yaml", "apis/orders/swagger.yaml"]))
        .expect("resolve");
    assert_eq!(set.len(), 1);
}

// ---------------------------------------------------------------------------
// 3. Cache and retries
// ---------------------------------------------------------------------------

#[test]
fn shared_classifier_cache_records_visited_directories() {
    let repo = sample_repo();
    let mut classifier = Classifier::new(repo.path());
    resolve_with(&mut classifier, &paths(&["apis/orders/deployment/v1.json"])).expect("resolve");

    let cache = classifier.into_cache();
    assert_eq!(cache.get(repo.path()), Some(&None));
    assert_eq!(cache.get(&repo.path().join("apis")), Some(&None));
    assert!(cache.get(&repo.path().join("apis/orders")).unwrap().is_some());
    // The walk stops at the first project root.
    assert!(!cache.contains_key(&repo.path().join("apis/orders/deployment")));
}

#[test]
fn failed_projects_are_requeued_once() {
    let repo = sample_repo();
    let mut classifier = Classifier::new(repo.path());
    let mut set = resolve_with(&mut classifier, &paths(&["apis/orders/swagger.yaml"])).expect("resolve");

    let added = requeue_failed(
        &mut classifier,
        &mut set,
        &paths(&["apis/orders", "products/gold", "apis/removed", "apps/billing"]),
    )
    .expect("requeue");

    assert_eq!(added, 1);
    assert_eq!(set.len(), 2);
    assert!(set.contains(&repo.path().join("products/gold")));
    assert!(!set.contains(&repo.path().join("apis/removed")));
    assert_eq!(set.group(ProjectType::Api)[0].origin, Origin::Diff);
    let product = &set.group(ProjectType::ApiProduct)[0];
    assert_eq!(product.origin, Origin::PreviouslyFailed);
    assert_eq!(product.project.relative_path, PathBuf::from("products/gold"));
}
