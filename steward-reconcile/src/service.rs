//! The hosting-service port and the value types that cross it.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use steward_core::{DesiredRepoConfig, ProjectId, RemoteRepository};

use crate::diff::RepoPatch;
use crate::error::RemoteError;
use crate::protection::{ObservedProtection, ProtectionPatch, ProtectionRules};

/// Result of fetching something that may legitimately be absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

/// An organization that owns repositories on the hosting service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    pub login: String,
}

impl Namespace {
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
        }
    }
}

/// Namespaces visible to the caller, keyed by lower-cased login.
#[derive(Debug, Clone, Default)]
pub struct NamespaceIndex {
    by_name: BTreeMap<String, Namespace>,
}

impl NamespaceIndex {
    /// Case-insensitive lookup.
    pub fn resolve(&self, name: &str) -> Option<&Namespace> {
        self.by_name.get(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl FromIterator<Namespace> for NamespaceIndex {
    fn from_iter<I: IntoIterator<Item = Namespace>>(iter: I) -> Self {
        Self {
            by_name: iter
                .into_iter()
                .map(|ns| (ns.login.to_lowercase(), ns))
                .collect(),
        }
    }
}

/// A repository address: owning namespace login plus repository name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Address of `project` under the resolved `namespace` login.
    pub fn in_namespace(namespace: &Namespace, project: &ProjectId) -> Self {
        Self::new(namespace.login.clone(), project.name())
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A branch as reported by the hosting service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub name: String,
    /// `false` means the protection endpoint has nothing to report.
    pub protected: bool,
}

/// Initial properties for a repository that does not exist yet.
///
/// Serializes to the creation payload; always asks the provider to
/// initialise the default branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateRepository {
    pub name: String,
    pub description: Option<String>,
    pub allow_merge_commit: bool,
    pub allow_rebase_merge: bool,
    pub allow_squash_merge: bool,
    pub has_downloads: bool,
    pub has_issues: bool,
    pub has_projects: bool,
    pub has_wiki: bool,
    pub auto_init: bool,
}

impl CreateRepository {
    pub fn new(name: impl Into<String>, desired: &DesiredRepoConfig) -> Self {
        Self {
            name: name.into(),
            description: desired.description.clone(),
            allow_merge_commit: desired.allow_merge_commit,
            allow_rebase_merge: desired.allow_rebase_merge,
            allow_squash_merge: desired.allow_squash_merge,
            has_downloads: desired.has_downloads,
            has_issues: desired.has_issues,
            has_projects: desired.has_projects,
            has_wiki: desired.has_wiki,
            auto_init: true,
        }
    }
}

/// Blocking access to a repository hosting service.
///
/// Implementations report absence through [`Lookup::NotFound`] and reserve
/// [`RemoteError`] for transport, authentication and server failures.
pub trait HostingService {
    /// Namespaces the authenticated caller belongs to.
    fn namespaces(&self) -> Result<Vec<Namespace>, RemoteError>;

    fn get_repository(&self, repo: &RepoRef) -> Result<Lookup<RemoteRepository>, RemoteError>;

    fn create_repository(
        &self,
        namespace: &Namespace,
        request: &CreateRepository,
    ) -> Result<RemoteRepository, RemoteError>;

    /// Apply a non-empty patch in a single call.
    fn update_repository(&self, repo: &RepoRef, patch: &RepoPatch) -> Result<(), RemoteError>;

    fn get_branch(&self, repo: &RepoRef, branch: &str) -> Result<Lookup<Branch>, RemoteError>;

    /// `NotFound` means the branch has no protection configured.
    fn get_branch_protection(
        &self,
        repo: &RepoRef,
        branch: &str,
    ) -> Result<Lookup<ObservedProtection>, RemoteError>;

    /// Protect an unprotected branch with the full ruleset.
    fn create_branch_protection(
        &self,
        repo: &RepoRef,
        branch: &str,
        rules: &ProtectionRules,
    ) -> Result<(), RemoteError>;

    /// Change only the fields present in `patch` on an already protected branch.
    fn update_branch_protection(
        &self,
        repo: &RepoRef,
        branch: &str,
        patch: &ProtectionPatch,
    ) -> Result<(), RemoteError>;
}
