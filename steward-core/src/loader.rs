//! YAML loaders for desired-state files.
//!
//! # File layout
//!
//! ```text
//! github/
//!   projects.yaml                  (desired-state project list)
//!   acls/
//!     <namespace>/
//!       <name>.config              (branch protection entries, optional)
//! zuul.d/
//!   projects.yaml                  (CI registry)
//! ```
//!
//! Every loader takes an explicit path; nothing is read at import time.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::error::{io_err, LoadError};
use crate::registry::RegistryEntry;
use crate::types::{BranchProtectionSpec, ProjectId, ProjectSpec};

// ---------------------------------------------------------------------------
// 1. Generic sequence loader
// ---------------------------------------------------------------------------

/// Read `path` as a YAML sequence of `T`.
///
/// An empty (or comment-only) document is an empty sequence. Returns
/// `LoadError::NotFound` if the file is absent and `LoadError::Parse` with the
/// path attached when the content is malformed.
pub fn load_sequence_at<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    if is_blank_document(&contents) {
        return Ok(Vec::new());
    }
    let parsed: Option<Vec<T>> = serde_yaml::from_str(&contents).map_err(|e| LoadError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(parsed.unwrap_or_default())
}

fn is_blank_document(contents: &str) -> bool {
    contents
        .lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with('#') || line == "---")
}

// ---------------------------------------------------------------------------
// 2. Project list
// ---------------------------------------------------------------------------

/// Load the desired-state project list, preserving input order.
pub fn load_projects_at(path: &Path) -> Result<Vec<ProjectSpec>, LoadError> {
    load_sequence_at(path)
}

// ---------------------------------------------------------------------------
// 3. ACL files
// ---------------------------------------------------------------------------

/// Path of the ACL file for `project` under `root`. Does no I/O.
pub fn acl_path_at(root: &Path, project: &ProjectId) -> PathBuf {
    root.join("acls")
        .join(project.namespace())
        .join(format!("{}.config", project.name()))
}

/// Source of per-project branch protection rules.
pub trait ProtectionSource {
    /// Rules for `project`, in file order. No rules is not an error.
    fn protections_for(&self, project: &ProjectId) -> Result<Vec<BranchProtectionSpec>, LoadError>;
}

/// ACL files stored next to the project list.
#[derive(Debug, Clone)]
pub struct AclDirectory {
    root: PathBuf,
}

impl AclDirectory {
    /// ACLs rooted at `root` (the directory containing `acls/`).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// ACLs for a project list: rooted at the list's parent directory.
    pub fn beside(projects_file: &Path) -> Self {
        let root = projects_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ProtectionSource for AclDirectory {
    fn protections_for(&self, project: &ProjectId) -> Result<Vec<BranchProtectionSpec>, LoadError> {
        match load_sequence_at(&acl_path_at(&self.root, project)) {
            Err(LoadError::NotFound { .. }) => Ok(Vec::new()),
            other => other,
        }
    }
}

// ---------------------------------------------------------------------------
// 4. CI registry
// ---------------------------------------------------------------------------

/// Load the CI pipeline registry, preserving input order.
pub fn load_registry_at(path: &Path) -> Result<Vec<RegistryEntry>, LoadError> {
    load_sequence_at(path)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
