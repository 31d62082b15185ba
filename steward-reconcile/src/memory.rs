//! In-memory [`HostingService`] that records every mutation.
//!
//! Mutations are applied to the stored state, so a second reconcile pass
//! observes what the first one wrote.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};

use steward_core::RemoteRepository;

use crate::diff::RepoPatch;
use crate::error::RemoteError;
use crate::protection::{ObservedProtection, ProtectionPatch, ProtectionRules, StatusChecks};
use crate::service::{Branch, CreateRepository, HostingService, Lookup, Namespace, RepoRef};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Create { repo: RepoRef, request: CreateRepository },
    Update { repo: RepoRef, patch: RepoPatch },
    CreateProtection { repo: RepoRef, branch: String, rules: ProtectionRules },
    UpdateProtection { repo: RepoRef, branch: String, patch: ProtectionPatch },
}

#[derive(Default)]
struct State {
    repos: BTreeMap<RepoRef, RemoteRepository>,
    /// `None` value: branch exists without protection.
    branches: BTreeMap<(RepoRef, String), Option<ObservedProtection>>,
    calls: Vec<Call>,
}

pub(crate) struct MemoryHost {
    namespaces: Vec<Namespace>,
    failing: BTreeSet<RepoRef>,
    state: RefCell<State>,
    protection_reads: Cell<usize>,
}

/// Remote state matching the defaults of an option-less project spec.
pub(crate) fn default_remote(name: &str) -> RemoteRepository {
    RemoteRepository {
        name: name.to_string(),
        description: None,
        default_branch: "master".to_string(),
        archived: false,
        allow_merge_commit: true,
        allow_rebase_merge: false,
        allow_squash_merge: true,
        has_downloads: false,
        has_issues: true,
        has_projects: false,
        has_wiki: false,
    }
}

impl MemoryHost {
    pub(crate) fn new(namespaces: &[&str]) -> Self {
        Self {
            namespaces: namespaces.iter().map(|n| Namespace::new(*n)).collect(),
            failing: BTreeSet::new(),
            state: RefCell::new(State::default()),
            protection_reads: Cell::new(0),
        }
    }

    /// Add a repository (default-valued, then edited by `edit`) with an
    /// unprotected default branch.
    pub(crate) fn with_repo(self, owner: &str, name: &str, edit: impl FnOnce(&mut RemoteRepository)) -> Self {
        let mut repo = default_remote(name);
        edit(&mut repo);
        {
            let mut state = self.state.borrow_mut();
            let key = RepoRef::new(owner, name);
            state.branches.insert((key.clone(), repo.default_branch.clone()), None);
            state.repos.insert(key, repo);
        }
        self
    }

    pub(crate) fn with_protection(
        self,
        owner: &str,
        name: &str,
        branch: &str,
        protection: ObservedProtection,
    ) -> Self {
        self.state
            .borrow_mut()
            .branches
            .insert((RepoRef::new(owner, name), branch.to_string()), Some(protection));
        self
    }

    /// Every call touching this repository fails with HTTP 500.
    pub(crate) fn failing(mut self, owner: &str, name: &str) -> Self {
        self.failing.insert(RepoRef::new(owner, name));
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    /// How many times `get_branch_protection` was called.
    pub(crate) fn protection_reads(&self) -> usize {
        self.protection_reads.get()
    }

    pub(crate) fn repo(&self, owner: &str, name: &str) -> Option<RemoteRepository> {
        self.state.borrow().repos.get(&RepoRef::new(owner, name)).cloned()
    }

    pub(crate) fn protection(&self, owner: &str, name: &str, branch: &str) -> Option<ObservedProtection> {
        self.state
            .borrow()
            .branches
            .get(&(RepoRef::new(owner, name), branch.to_string()))
            .cloned()
            .flatten()
    }

    fn check(&self, method: &'static str, repo: &RepoRef) -> Result<(), RemoteError> {
        if self.failing.contains(repo) {
            return Err(RemoteError::Status {
                method,
                url: format!("memory://{repo}"),
                status: 500,
                message: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

impl HostingService for MemoryHost {
    fn namespaces(&self) -> Result<Vec<Namespace>, RemoteError> {
        Ok(self.namespaces.clone())
    }

    fn get_repository(&self, repo: &RepoRef) -> Result<Lookup<RemoteRepository>, RemoteError> {
        self.check("GET", repo)?;
        Ok(match self.state.borrow().repos.get(repo) {
            Some(found) => Lookup::Found(found.clone()),
            None => Lookup::NotFound,
        })
    }

    fn create_repository(
        &self,
        namespace: &Namespace,
        request: &CreateRepository,
    ) -> Result<RemoteRepository, RemoteError> {
        let key = RepoRef::new(namespace.login.clone(), request.name.clone());
        self.check("POST", &key)?;
        let created = RemoteRepository {
            name: request.name.clone(),
            description: request.description.clone(),
            default_branch: "master".to_string(),
            archived: false,
            allow_merge_commit: request.allow_merge_commit,
            allow_rebase_merge: request.allow_rebase_merge,
            allow_squash_merge: request.allow_squash_merge,
            has_downloads: request.has_downloads,
            has_issues: request.has_issues,
            has_projects: request.has_projects,
            has_wiki: request.has_wiki,
        };
        let mut state = self.state.borrow_mut();
        if request.auto_init {
            state.branches.insert((key.clone(), created.default_branch.clone()), None);
        }
        state.repos.insert(key.clone(), created.clone());
        state.calls.push(Call::Create {
            repo: key,
            request: request.clone(),
        });
        Ok(created)
    }

    fn update_repository(&self, repo: &RepoRef, patch: &RepoPatch) -> Result<(), RemoteError> {
        self.check("PATCH", repo)?;
        let mut state = self.state.borrow_mut();
        if let Some(stored) = state.repos.get_mut(repo) {
            patch.apply_to(stored);
        }
        state.calls.push(Call::Update {
            repo: repo.clone(),
            patch: patch.clone(),
        });
        Ok(())
    }

    fn get_branch(&self, repo: &RepoRef, branch: &str) -> Result<Lookup<Branch>, RemoteError> {
        self.check("GET", repo)?;
        Ok(match self.state.borrow().branches.get(&(repo.clone(), branch.to_string())) {
            Some(protection) => Lookup::Found(Branch {
                name: branch.to_string(),
                protected: protection.is_some(),
            }),
            None => Lookup::NotFound,
        })
    }

    fn get_branch_protection(
        &self,
        repo: &RepoRef,
        branch: &str,
    ) -> Result<Lookup<ObservedProtection>, RemoteError> {
        self.protection_reads.set(self.protection_reads.get() + 1);
        self.check("GET", repo)?;
        Ok(match self.state.borrow().branches.get(&(repo.clone(), branch.to_string())) {
            Some(Some(protection)) => Lookup::Found(protection.clone()),
            _ => Lookup::NotFound,
        })
    }

    fn create_branch_protection(
        &self,
        repo: &RepoRef,
        branch: &str,
        rules: &ProtectionRules,
    ) -> Result<(), RemoteError> {
        self.check("PUT", repo)?;
        let mut state = self.state.borrow_mut();
        state.branches.insert(
            (repo.clone(), branch.to_string()),
            Some(ObservedProtection {
                enforce_admins: rules.enforce_admins,
                required_status_checks: rules
                    .contexts
                    .clone()
                    .map(|contexts| StatusChecks { contexts }),
            }),
        );
        state.calls.push(Call::CreateProtection {
            repo: repo.clone(),
            branch: branch.to_string(),
            rules: rules.clone(),
        });
        Ok(())
    }

    fn update_branch_protection(
        &self,
        repo: &RepoRef,
        branch: &str,
        patch: &ProtectionPatch,
    ) -> Result<(), RemoteError> {
        self.check("PATCH", repo)?;
        let mut state = self.state.borrow_mut();
        if let Some(Some(current)) = state.branches.get_mut(&(repo.clone(), branch.to_string())) {
            if let Some(enforce_admins) = patch.enforce_admins {
                current.enforce_admins = enforce_admins;
            }
            if let (Some(contexts), Some(checks)) = (&patch.contexts, current.required_status_checks.as_mut()) {
                checks.contexts = contexts.clone();
            }
        }
        state.calls.push(Call::UpdateProtection {
            repo: repo.clone(),
            branch: branch.to_string(),
            patch: patch.clone(),
        });
        Ok(())
    }
}
