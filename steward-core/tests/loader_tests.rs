//! Loader error-message and file-convention integration tests.
//! Layout under test: <root>/projects.yaml, <root>/acls/<ns>/<name>.config

use assert_fs::prelude::*;
use predicates::prelude::predicate;
use rstest::rstest;
use steward_core::{
    loader::{self, acl_path_at},
    AclDirectory, LoadError, PipelineKind, ProjectId, ProtectionSource, RepoOption,
};

fn id(raw: &str) -> ProjectId {
    raw.parse().expect("project id")
}

// ---------------------------------------------------------------------------
// 1. Project list
// ---------------------------------------------------------------------------

#[test]
fn project_list_preserves_order_and_fields() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let file = root.child("projects.yaml");
    file.write_str(
        "- project: org/zeta\n  description: Last letter\n- project: org/alpha\n  options:\n    - has-wiki\n    - has-downloads\n  default-branch: main\n- project: other/legacy\n  archived: true\n",
    )
    .expect("write");

    let projects = loader::load_projects_at(file.path()).expect("load");
    let names: Vec<String> = projects.iter().map(|p| p.project.to_string()).collect();
    assert_eq!(names, vec!["org/zeta", "org/alpha", "other/legacy"]);
    assert_eq!(projects[0].description.as_deref(), Some("Last letter"));
    assert!(projects[1].options.contains(&RepoOption::HasWiki));
    assert!(projects[1].options.contains(&RepoOption::HasDownloads));
    assert_eq!(projects[1].effective_default_branch(), "main");
    assert_eq!(projects[0].effective_default_branch(), "master");
    assert!(projects[2].archived);
}

#[rstest]
#[case("- project: no-slash\n")]
#[case("- project: /repo\n")]
#[case("- project: org/\n")]
fn malformed_identifier_is_parse_error_with_path(#[case] yaml: &str) {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let file = root.child("projects.yaml");
    file.write_str(yaml).expect("write");

    let err = loader::load_projects_at(file.path()).unwrap_err();
    assert!(matches!(err, LoadError::Parse { .. }), "got: {err}");
    let msg = err.to_string();
    assert!(msg.contains("projects.yaml"), "must contain file path, got: {msg}");
    let source_msg = match &err {
        LoadError::Parse { source, .. } => source.to_string(),
        _ => unreachable!(),
    };
    assert!(source_msg.contains("namespace/name"), "got: {source_msg}");
}

#[test]
fn missing_project_list_is_not_found() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let err = loader::load_projects_at(&root.path().join("projects.yaml")).unwrap_err();
    assert!(matches!(err, LoadError::NotFound { .. }));
    assert!(err.to_string().contains("projects.yaml"));
}

// ---------------------------------------------------------------------------
// 2. ACL files
// ---------------------------------------------------------------------------

#[test]
fn acl_file_is_located_beside_project_list() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let projects = root.child("projects.yaml");
    projects.write_str("- project: org/repo\n").expect("write");
    root.child("acls/org/repo.config")
        .write_str(
            "- name: master\n  enforce_admins: true\n  required_status_checks:\n    contexts:\n      - ci\n- name: stable\n",
        )
        .expect("write acl");

    let acls = AclDirectory::beside(projects.path());
    let rules = acls.protections_for(&id("org/repo")).expect("rules");
    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0].name, "master");
    assert!(rules[0].enforce_admins);
    assert_eq!(rules[0].contexts.as_deref(), Some(&["ci".to_string()][..]));
    assert_eq!(rules[1].name, "stable");
    assert!(rules[1].contexts.is_none());

    let expected = root.child("acls/org/repo.config");
    expected.assert(predicate::path::exists());
    assert_eq!(acl_path_at(acls.root(), &id("org/repo")), expected.path());
}

#[test]
fn absent_acl_file_means_no_rules() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let acls = AclDirectory::new(root.path());
    let rules = acls.protections_for(&id("org/unprotected")).expect("rules");
    assert!(rules.is_empty());
}

#[test]
fn corrupt_acl_file_is_an_error() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child("acls/org/repo.config")
        .write_str("- enforce_admins: [not, a, bool]\n")
        .expect("write acl");
    let err = AclDirectory::new(root.path())
        .protections_for(&id("org/repo"))
        .unwrap_err();
    assert!(matches!(err, LoadError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("repo.config"));
}

// ---------------------------------------------------------------------------
// 3. CI registry
// ---------------------------------------------------------------------------

#[test]
fn registry_loads_pipelines_and_templates() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let file = root.child("zuul-projects.yaml");
    file.write_str(
        r#"
- project:
    name: github.com/org/alpha
    default-branch: main
    templates:
      - publish-to-pypi
    gate:
      jobs:
        - tox-py3
        - tox-docs:
            voting: false
- project:
    name: github.com/org/beta
"#,
    )
    .expect("write");

    let entries = loader::load_registry_at(file.path()).expect("load");
    assert_eq!(entries.len(), 2);
    let alpha = &entries[0].project;
    assert_eq!(alpha.name, "github.com/org/alpha");
    assert_eq!(alpha.default_branch.as_deref(), Some("main"));
    assert_eq!(alpha.templates, vec!["publish-to-pypi"]);
    assert_eq!(alpha.pipeline(PipelineKind::Gate).expect("gate").jobs.len(), 2);
    assert_eq!(entries[1].project.key_count(), 1);
}

#[test]
fn registry_with_wrong_shape_is_parse_error() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let file = root.child("zuul-projects.yaml");
    file.write_str("project:\n  name: not-a-list\n").expect("write");
    let err = loader::load_registry_at(file.path()).unwrap_err();
    assert!(matches!(err, LoadError::Parse { .. }), "got: {err}");
}
