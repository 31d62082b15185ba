//! The registry checks.
//!
//! Each check is a free function over already-loaded inputs that returns a
//! [`CheckOutcome`]; none of them reads files or stops at the first finding.

use std::path::Path;

use steward_core::{PipelineKind, ProjectSpec, RegistryEntry, DEFAULT_BRANCH};

use crate::policy::{CursorPolicy, LintPolicy};
use crate::remote::{BranchLookup, Readiness};
use crate::report::{CheckOutcome, Finding, LintReport};

/// Everything the checks read.
pub struct LintInputs<'a> {
    pub registry_path: &'a Path,
    pub registry: &'a [RegistryEntry],
    pub projects: &'a [ProjectSpec],
    pub policy: &'a LintPolicy,
    pub lookup: &'a dyn BranchLookup,
}

/// Run every check, in a fixed order, and collect the outcomes.
pub fn run_all(inputs: &LintInputs<'_>) -> LintReport {
    let LintInputs {
        registry,
        projects,
        policy,
        lookup,
        ..
    } = inputs;

    let checks = vec![
        check_sorted(registry, policy.sort_cursor),
        check_remote_default_branch(registry, policy, *lookup),
        check_default_branch_agreement(projects, registry, policy),
        check_denied_templates(registry, policy),
        check_release_templates(registry, policy),
        check_voting(registry),
        check_non_empty(registry),
    ];
    for check in &checks {
        tracing::debug!(check = check.name, findings = check.findings.len(), "check finished");
    }

    LintReport {
        registry: inputs.registry_path.to_path_buf(),
        checks,
    }
}

/// Lower-cased with `_` folded to `-`.
fn normalize(name: &str) -> String {
    name.to_lowercase().replace('_', "-")
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

pub fn check_sorted(entries: &[RegistryEntry], cursor: CursorPolicy) -> CheckOutcome {
    let mut outcome = CheckOutcome::new("sorted", "Checking project list for alphabetical order");
    let mut last: Option<&str> = None;
    for entry in entries {
        let current = entry.name();
        let offender = last.filter(|prev| normalize(prev) > normalize(current));
        if let Some(prev) = offender {
            outcome
                .findings
                .push(Finding::new(format!("Wrong alphabetical order: {prev}, {current}")));
        }
        if offender.is_none() || cursor == CursorPolicy::Advance {
            last = Some(current);
        }
    }
    outcome
}

// ---------------------------------------------------------------------------
// Default branches
// ---------------------------------------------------------------------------

pub fn check_remote_default_branch(
    entries: &[RegistryEntry],
    policy: &LintPolicy,
    lookup: &dyn BranchLookup,
) -> CheckOutcome {
    let mut outcome = CheckOutcome::new(
        "remote-default-branch",
        "Checking if the hosting service and local default-branch config are consistent",
    );
    if let Readiness::Unavailable(reason) = lookup.prepare() {
        tracing::warn!(%reason, "skipping remote default-branch check");
        outcome.warnings.push(format!("{reason}, skipping the check"));
        return outcome;
    }

    for entry in entries {
        let name = entry.name();
        let Some(repo) = policy.strip_host(name) else {
            continue;
        };
        let expected = entry.project.default_branch.as_deref().unwrap_or(DEFAULT_BRANCH);
        match lookup.default_branch(repo) {
            Ok(actual) if actual == expected => {}
            Ok(actual) => outcome.findings.push(Finding::new(format!(
                "Repo {name}'s default-branch should be {actual}"
            ))),
            Err(err) => outcome.findings.push(Finding::new(format!(
                "Could not query the default branch of {name}: {err}"
            ))),
        }
    }
    outcome
}

/// Declared values are compared as written; an absent value only agrees
/// with another absent value.
pub fn check_default_branch_agreement(
    projects: &[ProjectSpec],
    entries: &[RegistryEntry],
    policy: &LintPolicy,
) -> CheckOutcome {
    let mut outcome = CheckOutcome::new("default-branch-agreement", "Checking local default-branch consistency");
    for project in projects {
        let wanted = policy.registry_name(&project.project.to_string());
        let Some(entry) = entries.iter().find(|e| e.name() == wanted) else {
            continue;
        };
        let desired = project.default_branch.as_deref();
        let registered = entry.project.default_branch.as_deref();
        if desired != registered {
            outcome.findings.push(Finding::new(format!(
                "Wrong default-branch for {wanted}: {} in the project list vs {} in the registry",
                desired.unwrap_or("(unset)"),
                registered.unwrap_or("(unset)"),
            )));
        }
    }
    outcome
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

fn templates_in<'e>(entry: &'e RegistryEntry, set: &std::collections::BTreeSet<String>) -> Vec<&'e str> {
    entry
        .project
        .templates
        .iter()
        .filter(|t| set.contains(*t))
        .map(String::as_str)
        .collect()
}

pub fn check_release_templates(entries: &[RegistryEntry], policy: &LintPolicy) -> CheckOutcome {
    let mut outcome = CheckOutcome::new("release-templates", "Checking release jobs");
    for entry in entries {
        let found = templates_in(entry, &policy.release_templates);
        if found.len() > 1 {
            outcome.findings.push(
                Finding::new(format!("Found multiple release jobs for {}:", entry.name()))
                    .with_details(found),
            );
        }
    }
    if outcome.had_errors() {
        outcome.guidance.push("Use only one of them.".to_string());
    }
    outcome
}

pub fn check_denied_templates(entries: &[RegistryEntry], policy: &LintPolicy) -> CheckOutcome {
    let mut outcome = CheckOutcome::new("denied-templates", "Checking for obsolete jobs and templates");
    for entry in entries {
        let found = templates_in(entry, &policy.denied_templates);
        if !found.is_empty() {
            outcome.findings.push(
                Finding::new(format!("Found obsolete template for {}:", entry.name()))
                    .with_details(found),
            );
        }
    }
    if outcome.had_errors() {
        outcome.guidance.push("Remove it.".to_string());
    }
    outcome
}

// ---------------------------------------------------------------------------
// Voting
// ---------------------------------------------------------------------------

const GATE_NOTE: &str =
    "Never run non-voting jobs in gate pipeline, they just waste resources, remove such jobs.";
const REDUNDANT_NOTE: &str = "Experimental, periodic, and post pipelines are always non-voting. \
                              The 'voting: false' line is redundant, remove it.";

pub fn check_voting(entries: &[RegistryEntry]) -> CheckOutcome {
    let mut outcome = CheckOutcome::new("voting", "Checking voting status of jobs");
    let mut gate_flagged = false;
    let mut other_flagged = false;

    for entry in entries {
        for kind in PipelineKind::ALL {
            let Some(pipeline) = entry.project.pipeline(kind) else {
                continue;
            };
            for job in pipeline.jobs.iter().flat_map(|j| j.non_voting()) {
                if kind == PipelineKind::Gate {
                    gate_flagged = true;
                } else {
                    other_flagged = true;
                }
                outcome.findings.push(
                    Finding::new(format!("Found non-voting job in {kind}:"))
                        .with_details([format!("project: {}", entry.name()), format!("job: {job}")]),
                );
            }
        }
    }

    if gate_flagged {
        outcome.guidance.push(GATE_NOTE.to_string());
    }
    if other_flagged {
        outcome.guidance.push(REDUNDANT_NOTE.to_string());
    }
    outcome
}

// ---------------------------------------------------------------------------
// Boilerplate
// ---------------------------------------------------------------------------

pub fn check_non_empty(entries: &[RegistryEntry]) -> CheckOutcome {
    let mut outcome = CheckOutcome::new("non-empty", "Checking that every project has entries");
    for entry in entries.iter().filter(|e| e.project.key_count() <= 1) {
        outcome.findings.push(Finding::new(format!(
            "Found project {} with no jobs configured.",
            entry.name()
        )));
    }
    if outcome.had_errors() {
        outcome.guidance.push(
            "Do not add projects with only a name entry but no jobs, \
             remove the entry completely unless you forgot to add jobs."
                .to_string(),
        );
    }
    outcome
}
