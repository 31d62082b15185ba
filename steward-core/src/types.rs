//! Domain types for repository desired state.
//!
//! Desired state comes from the project list and ACL files; observed state
//! ([`RemoteRepository`]) is deserialized straight from hosting API payloads.
//! Nothing here performs I/O.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LoadError;

/// Default branch assumed when a project does not declare one.
pub const DEFAULT_BRANCH: &str = "master";

// ---------------------------------------------------------------------------
// ProjectId
// ---------------------------------------------------------------------------

/// A validated `namespace/name` repository identifier.
///
/// The identifier is split on the first `/`; both halves must be non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectId {
    namespace: String,
    name: String,
}

impl ProjectId {
    /// Owning namespace, as written in the project list.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Repository name within the namespace.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FromStr for ProjectId {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((namespace, name)) if !namespace.is_empty() && !name.is_empty() => Ok(Self {
                namespace: namespace.to_owned(),
                name: name.to_owned(),
            }),
            _ => Err(LoadError::InvalidProjectId(s.to_owned())),
        }
    }
}

impl TryFrom<String> for ProjectId {
    type Error = LoadError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ProjectId> for String {
    fn from(id: ProjectId) -> Self {
        id.to_string()
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Repository feature flags that may appear under `options:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepoOption {
    HasDownloads,
    HasIssues,
    HasProjects,
    HasWiki,
}

impl RepoOption {
    /// Value used when the option is not listed.
    pub fn default_enabled(self) -> bool {
        matches!(self, RepoOption::HasIssues)
    }
}

impl fmt::Display for RepoOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepoOption::HasDownloads => write!(f, "has-downloads"),
            RepoOption::HasIssues => write!(f, "has-issues"),
            RepoOption::HasProjects => write!(f, "has-projects"),
            RepoOption::HasWiki => write!(f, "has-wiki"),
        }
    }
}

// ---------------------------------------------------------------------------
// Desired state
// ---------------------------------------------------------------------------

/// One entry of the desired-state project list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProjectSpec {
    pub project: ProjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub options: BTreeSet<RepoOption>,
    #[serde(default)]
    pub archived: bool,
}

impl ProjectSpec {
    /// A spec with every optional field left at its default.
    pub fn new(project: ProjectId) -> Self {
        Self {
            project,
            description: None,
            default_branch: None,
            options: BTreeSet::new(),
            archived: false,
        }
    }

    /// Declared default branch, falling back to [`DEFAULT_BRANCH`].
    pub fn effective_default_branch(&self) -> &str {
        self.default_branch.as_deref().unwrap_or(DEFAULT_BRANCH)
    }

    fn option(&self, option: RepoOption) -> bool {
        self.options.contains(&option) || option.default_enabled()
    }
}

/// Fully resolved repository settings: fixed merge policy plus a [`ProjectSpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredRepoConfig {
    pub description: Option<String>,
    pub default_branch: String,
    pub allow_merge_commit: bool,
    pub allow_rebase_merge: bool,
    pub allow_squash_merge: bool,
    pub has_downloads: bool,
    pub has_issues: bool,
    pub has_projects: bool,
    pub has_wiki: bool,
    /// Requests the one-way archive transition.
    pub archived: bool,
}

impl From<&ProjectSpec> for DesiredRepoConfig {
    fn from(spec: &ProjectSpec) -> Self {
        Self {
            description: spec.description.clone(),
            default_branch: spec.effective_default_branch().to_owned(),
            allow_merge_commit: true,
            allow_rebase_merge: false,
            allow_squash_merge: true,
            has_downloads: spec.option(RepoOption::HasDownloads),
            has_issues: spec.option(RepoOption::HasIssues),
            has_projects: spec.option(RepoOption::HasProjects),
            has_wiki: spec.option(RepoOption::HasWiki),
            archived: spec.archived,
        }
    }
}

// ---------------------------------------------------------------------------
// Observed state
// ---------------------------------------------------------------------------

/// Repository attributes as reported by the hosting service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRepository {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub default_branch: String,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub allow_merge_commit: bool,
    #[serde(default)]
    pub allow_rebase_merge: bool,
    #[serde(default)]
    pub allow_squash_merge: bool,
    #[serde(default)]
    pub has_downloads: bool,
    #[serde(default)]
    pub has_issues: bool,
    #[serde(default)]
    pub has_projects: bool,
    #[serde(default)]
    pub has_wiki: bool,
}

// ---------------------------------------------------------------------------
// Branch protection
// ---------------------------------------------------------------------------

/// Desired protection rules for one branch, from a project's ACL file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "AclEntry")]
pub struct BranchProtectionSpec {
    pub name: String,
    pub enforce_admins: bool,
    /// Required status-check contexts, in order. `None` leaves checks alone.
    pub contexts: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct AclEntry {
    name: String,
    #[serde(default)]
    enforce_admins: bool,
    #[serde(default)]
    required_status_checks: Option<AclStatusChecks>,
}

#[derive(Deserialize)]
struct AclStatusChecks {
    #[serde(default)]
    contexts: Option<Vec<String>>,
}

impl From<AclEntry> for BranchProtectionSpec {
    fn from(entry: AclEntry) -> Self {
        Self {
            name: entry.name,
            enforce_admins: entry.enforce_admins,
            contexts: entry.required_status_checks.and_then(|c| c.contexts),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
