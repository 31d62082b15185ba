//! Branch-protection reconciliation.
//!
//! Only two fields are managed: `enforce_admins` and the required status
//! check contexts. Everything else about a branch's protection is left as the
//! hosting service has it.

use serde::{Deserialize, Serialize};

use steward_core::BranchProtectionSpec;

use crate::error::{remote_err, ReconcileError};
use crate::service::{HostingService, Lookup, RepoRef};

/// Observed `required_status_checks` object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChecks {
    #[serde(default)]
    pub contexts: Vec<String>,
}

/// Current protection of a branch, as far as the managed fields go.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservedProtection {
    pub enforce_admins: bool,
    /// `None` when the branch has no status-check requirement at all, which
    /// is distinct from a requirement with an empty context list.
    pub required_status_checks: Option<StatusChecks>,
}

/// Full ruleset applied to a branch that has no protection yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectionRules {
    pub enforce_admins: bool,
    pub contexts: Option<Vec<String>>,
}

impl From<&BranchProtectionSpec> for ProtectionRules {
    fn from(spec: &BranchProtectionSpec) -> Self {
        Self {
            enforce_admins: spec.enforce_admins,
            contexts: spec.contexts.clone(),
        }
    }
}

/// Changes to an existing protection. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtectionPatch {
    pub enforce_admins: Option<bool>,
    pub contexts: Option<Vec<String>>,
}

impl ProtectionPatch {
    pub fn is_empty(&self) -> bool {
        self.enforce_admins.is_none() && self.contexts.is_none()
    }
}

/// What [`reconcile_protection`] did to a branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtectionOutcome {
    Created(ProtectionRules),
    Updated(ProtectionPatch),
    Unchanged,
}

/// Patch for an already protected branch.
///
/// Contexts are patched only when the observed status-check object exists
/// and its contexts differ from the desired list.
pub fn diff_protection(desired: &BranchProtectionSpec, observed: &ObservedProtection) -> ProtectionPatch {
    let enforce_admins =
        (desired.enforce_admins != observed.enforce_admins).then_some(desired.enforce_admins);
    let contexts = match (&desired.contexts, &observed.required_status_checks) {
        (Some(wanted), Some(current)) if *wanted != current.contexts => Some(wanted.clone()),
        _ => None,
    };
    ProtectionPatch {
        enforce_admins,
        contexts,
    }
}

/// Bring one branch's protection in line with `spec`.
///
/// With `dry_run` the outcome is computed and logged but nothing is written.
pub fn reconcile_protection(
    host: &dyn HostingService,
    repo: &RepoRef,
    spec: &BranchProtectionSpec,
    dry_run: bool,
) -> Result<ProtectionOutcome, ReconcileError> {
    let branch = &spec.name;
    let context = || format!("branch protection of {repo}@{branch}");

    tracing::debug!(repo = %repo, branch = %branch, "fetching branch");
    let found = match host.get_branch(repo, branch).map_err(|e| remote_err(context(), e))? {
        Lookup::Found(found) => found,
        Lookup::NotFound => {
            return Err(ReconcileError::BranchNotFound {
                repo: repo.to_string(),
                branch: branch.clone(),
            })
        }
    };

    let observed = if found.protected {
        host.get_branch_protection(repo, branch)
            .map_err(|e| remote_err(context(), e))?
    } else {
        Lookup::NotFound
    };

    match observed {
        Lookup::NotFound => {
            let rules = ProtectionRules::from(spec);
            tracing::info!(
                repo = %repo,
                branch = %branch,
                enforce_admins = rules.enforce_admins,
                contexts = ?rules.contexts,
                "{}protecting branch",
                dry_run_prefix(dry_run)
            );
            if !dry_run {
                host.create_branch_protection(repo, branch, &rules)
                    .map_err(|e| remote_err(context(), e))?;
            }
            Ok(ProtectionOutcome::Created(rules))
        }
        Lookup::Found(current) => {
            let patch = diff_protection(spec, &current);
            if patch.is_empty() {
                tracing::debug!(repo = %repo, branch = %branch, "branch protection unchanged");
                return Ok(ProtectionOutcome::Unchanged);
            }
            tracing::info!(
                repo = %repo,
                branch = %branch,
                enforce_admins = ?patch.enforce_admins,
                contexts = ?patch.contexts,
                "{}updating branch protection",
                dry_run_prefix(dry_run)
            );
            if !dry_run {
                host.update_branch_protection(repo, branch, &patch)
                    .map_err(|e| remote_err(context(), e))?;
            }
            Ok(ProtectionOutcome::Updated(patch))
        }
    }
}

pub(crate) fn dry_run_prefix(dry_run: bool) -> &'static str {
    if dry_run {
        "[dry-run] "
    } else {
        ""
    }
}
