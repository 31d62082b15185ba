//! `steward manage`: reconcile hosted repositories with the project list.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use steward_core::{loader, AclDirectory};
use steward_github::GitHubClient;
use steward_reconcile::{reconcile_all, ProjectOutcome, ProjectReport, ProtectionOutcome};

use crate::credentials::{expand_home, load_credentials, DEFAULT_CREDENTIALS_FILE};
use crate::logging::init_tracing;

/// Arguments for `steward manage`.
#[derive(Args, Debug)]
pub struct ManageArgs {
    /// Credentials file (INI with a `[github]` section holding `token`).
    #[arg(long, default_value = DEFAULT_CREDENTIALS_FILE)]
    pub config_file: PathBuf,

    /// Desired-state project list; ACL files are read from `acls/` beside it.
    #[arg(short = 'p', long = "projects", default_value = "github/projects.yaml")]
    pub projects: PathBuf,

    /// Log every change without writing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Verbose logging.
    #[arg(long)]
    pub debug: bool,
}

impl ManageArgs {
    pub fn run(self) -> Result<ExitCode> {
        init_tracing(self.debug);

        let credentials = expand_home(&self.config_file)?;
        let settings = load_credentials(&credentials)?;
        let specs = loader::load_projects_at(&self.projects)
            .with_context(|| format!("failed to load project list {}", self.projects.display()))?;

        let client = GitHubClient::new(&settings);
        let acls = AclDirectory::beside(&self.projects);
        let reports = reconcile_all(&client, &specs, &acls, self.dry_run)
            .context("reconciliation aborted")?;

        print_summary(&reports, self.dry_run);
        if reports.iter().any(ProjectReport::has_failures) {
            return Ok(ExitCode::FAILURE);
        }
        Ok(ExitCode::SUCCESS)
    }
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "project")]
    project: String,
    #[tabled(rename = "outcome")]
    outcome: String,
    #[tabled(rename = "changes")]
    changes: String,
    #[tabled(rename = "branches")]
    branches: String,
}

fn summary_row(report: &ProjectReport) -> SummaryRow {
    let changes = match &report.outcome {
        ProjectOutcome::Updated(patch) => patch.changed_fields().join(", "),
        ProjectOutcome::Failed { reason } => reason.clone(),
        _ => String::new(),
    };
    let branches = report
        .branches
        .iter()
        .map(|b| {
            let label = match &b.result {
                Ok(ProtectionOutcome::Created(_)) => "protected",
                Ok(ProtectionOutcome::Updated(_)) => "updated",
                Ok(ProtectionOutcome::Unchanged) => "unchanged",
                Err(_) => "failed",
            };
            format!("{}: {label}", b.branch)
        })
        .collect::<Vec<_>>()
        .join("\n");
    SummaryRow {
        project: report.project.to_string(),
        outcome: report.outcome.label().to_string(),
        changes,
        branches,
    }
}

fn print_summary(reports: &[ProjectReport], dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    if reports.is_empty() {
        println!("{prefix}No projects listed.");
        return;
    }

    let mut table = Table::new(reports.iter().map(summary_row));
    table.with(Style::rounded());
    println!("{table}");

    let failed = reports.iter().filter(|r| r.has_failures()).count();
    let summary = format!("{prefix}{} projects processed, {failed} with failures", reports.len());
    if failed > 0 {
        println!("{}", summary.red());
        for report in reports.iter().filter(|r| r.has_failures()) {
            for branch in &report.branches {
                if let Err(err) = &branch.result {
                    println!("  {} {}@{}: {err}", "✗".red(), report.project, branch.branch);
                }
            }
        }
    } else {
        println!("{}", summary.green());
    }
}
