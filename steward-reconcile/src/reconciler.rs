//! Per-project reconciliation and the whole-list entrypoint.
//!
//! ## Per project
//!
//! 1. Resolve the owning namespace (fatal if absent).
//! 2. Fetch the repository; create it when the service reports it missing.
//! 3. Skip archived repositories without touching them.
//! 4. Diff desired against observed and apply a non-empty patch in one call.
//! 5. Reconcile every branch listed in the project's ACL file.
//!
//! Remote failures are recorded on the project's report and the run moves on
//! to the next project; configuration errors abort the run.

use steward_core::{BranchProtectionSpec, DesiredRepoConfig, ProjectId, ProjectSpec, ProtectionSource};

use crate::diff::{diff, RepoPatch};
use crate::error::{remote_err, ReconcileError};
use crate::protection::{dry_run_prefix, reconcile_protection, ProtectionOutcome, ProtectionRules};
use crate::service::{CreateRepository, HostingService, Lookup, Namespace, NamespaceIndex, RepoRef};

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// What happened to one project's repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectOutcome {
    /// The repository did not exist and was created.
    Created,
    /// A non-empty patch was applied.
    Updated(RepoPatch),
    /// Remote state already matched.
    Unchanged,
    /// The repository is archived and was left alone.
    SkippedArchived,
    /// A remote call failed; the run continued with the next project.
    Failed { reason: String },
}

impl ProjectOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ProjectOutcome::Created => "created",
            ProjectOutcome::Updated(_) => "updated",
            ProjectOutcome::Unchanged => "unchanged",
            ProjectOutcome::SkippedArchived => "skipped-archived",
            ProjectOutcome::Failed { .. } => "failed",
        }
    }

    fn allows_protection(&self) -> bool {
        matches!(
            self,
            ProjectOutcome::Created | ProjectOutcome::Updated(_) | ProjectOutcome::Unchanged
        )
    }
}

/// Result of reconciling one ACL entry.
#[derive(Debug)]
pub struct BranchReport {
    pub branch: String,
    pub result: Result<ProtectionOutcome, ReconcileError>,
}

/// Everything done for one project entry.
#[derive(Debug)]
pub struct ProjectReport {
    pub project: ProjectId,
    pub outcome: ProjectOutcome,
    pub branches: Vec<BranchReport>,
}

impl ProjectReport {
    /// True if the repository or any branch failed.
    pub fn has_failures(&self) -> bool {
        matches!(self.outcome, ProjectOutcome::Failed { .. })
            || self.branches.iter().any(|b| b.result.is_err())
    }
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

/// Drives reconciliation of individual projects against one hosting service.
pub struct Reconciler<'a> {
    host: &'a dyn HostingService,
    namespaces: NamespaceIndex,
    dry_run: bool,
}

impl<'a> Reconciler<'a> {
    pub fn new(host: &'a dyn HostingService, namespaces: NamespaceIndex) -> Self {
        Self {
            host,
            namespaces,
            dry_run: false,
        }
    }

    /// Build a reconciler from the namespaces the host reports for the caller.
    pub fn connect(host: &'a dyn HostingService) -> Result<Self, ReconcileError> {
        let namespaces: NamespaceIndex = host
            .namespaces()
            .map_err(|e| remote_err("listing namespaces", e))?
            .into_iter()
            .collect();
        if namespaces.is_empty() {
            tracing::warn!("the configured credentials see no organizations");
        } else {
            tracing::debug!(count = namespaces.len(), "resolved namespaces");
        }
        Ok(Self::new(host, namespaces))
    }

    /// Compute and log every change without issuing any mutation.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// The namespace owning `project`, or `NamespaceNotFound`.
    pub fn resolve(&self, project: &ProjectId) -> Result<&Namespace, ReconcileError> {
        self.namespaces
            .resolve(project.namespace())
            .ok_or_else(|| ReconcileError::NamespaceNotFound {
                project: project.clone(),
                namespace: project.namespace().to_string(),
            })
    }

    /// Reconcile one project and, unless it was skipped or failed, its
    /// branch protections.
    ///
    /// Only fatal errors are returned as `Err`; remote failures are recorded
    /// in the report.
    pub fn reconcile(
        &self,
        spec: &ProjectSpec,
        protections: &[BranchProtectionSpec],
    ) -> Result<ProjectReport, ReconcileError> {
        let namespace = self.resolve(&spec.project)?;
        let repo = RepoRef::in_namespace(namespace, &spec.project);

        let outcome = match self.reconcile_repository(namespace, &repo, spec) {
            Ok(outcome) => outcome,
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                tracing::error!(project = %spec.project, error = %err, "repository reconciliation failed");
                ProjectOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        };

        let branches = if outcome.allows_protection() {
            protections
                .iter()
                .map(|rule| self.reconcile_branch(&repo, rule, &outcome))
                .collect()
        } else {
            Vec::new()
        };

        Ok(ProjectReport {
            project: spec.project.clone(),
            outcome,
            branches,
        })
    }

    fn reconcile_repository(
        &self,
        namespace: &Namespace,
        repo: &RepoRef,
        spec: &ProjectSpec,
    ) -> Result<ProjectOutcome, ReconcileError> {
        let desired = DesiredRepoConfig::from(spec);
        let prefix = dry_run_prefix(self.dry_run);

        tracing::info!("fetching repository info about {repo}");
        let observed = self
            .host
            .get_repository(repo)
            .map_err(|e| remote_err(format!("fetching {repo}"), e))?;

        let observed = match observed {
            Lookup::NotFound => {
                let request = CreateRepository::new(&repo.name, &desired);
                tracing::info!("{prefix}creating {repo}");
                if !self.dry_run {
                    self.host
                        .create_repository(namespace, &request)
                        .map_err(|e| remote_err(format!("creating {repo}"), e))?;
                }
                return Ok(ProjectOutcome::Created);
            }
            Lookup::Found(observed) => observed,
        };

        if observed.archived {
            tracing::info!("{repo} is archived, skipping");
            return Ok(ProjectOutcome::SkippedArchived);
        }

        let patch = diff(&desired, &observed);
        if patch.is_empty() {
            tracing::debug!("{repo} is up to date");
            return Ok(ProjectOutcome::Unchanged);
        }

        tracing::info!(
            fields = ?patch.changed_fields(),
            "{prefix}updating {repo}"
        );
        if !self.dry_run {
            self.host
                .update_repository(repo, &patch)
                .map_err(|e| remote_err(format!("updating {repo}"), e))?;
        }
        Ok(ProjectOutcome::Updated(patch))
    }

    fn reconcile_branch(
        &self,
        repo: &RepoRef,
        rule: &BranchProtectionSpec,
        outcome: &ProjectOutcome,
    ) -> BranchReport {
        // A repository that only exists on paper has no protected branches.
        let result = if self.dry_run && *outcome == ProjectOutcome::Created {
            tracing::info!("[dry-run] protecting {repo}@{}", rule.name);
            Ok(ProtectionOutcome::Created(ProtectionRules::from(rule)))
        } else {
            reconcile_protection(self.host, repo, rule, self.dry_run)
        };
        if let Err(err) = &result {
            tracing::error!(repo = %repo, branch = %rule.name, error = %err, "branch protection failed");
        }
        BranchReport {
            branch: rule.name.clone(),
            result,
        }
    }
}

// ---------------------------------------------------------------------------
// reconcile_all
// ---------------------------------------------------------------------------

/// Reconcile every project in input order.
///
/// Every namespace is resolved and every ACL file loaded before the first
/// mutation, so configuration errors abort the run with the remote untouched.
pub fn reconcile_all(
    host: &dyn HostingService,
    specs: &[ProjectSpec],
    acls: &dyn ProtectionSource,
    dry_run: bool,
) -> Result<Vec<ProjectReport>, ReconcileError> {
    let reconciler = Reconciler::connect(host)?.with_dry_run(dry_run);

    let mut planned = Vec::with_capacity(specs.len());
    for spec in specs {
        reconciler.resolve(&spec.project)?;
        planned.push((spec, acls.protections_for(&spec.project)?));
    }

    let mut reports = Vec::with_capacity(planned.len());
    for (spec, protections) in planned {
        tracing::info!("processing project: {}", spec.project);
        reports.push(reconciler.reconcile(spec, &protections)?);
    }
    Ok(reports)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
