//! `steward check`: registry consistency checks.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use steward_core::loader;
use steward_lint::{
    load_policy_at, run_all, BranchLookup, CheckOutcome, GhCli, LintInputs, LintPolicy, LintReport,
    NoRemote,
};

use crate::logging::init_tracing;

/// Arguments for `steward check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// CI project registry to check.
    #[arg(long, default_value = "zuul.d/projects.yaml")]
    pub registry: PathBuf,

    /// Desired-state project list, for default-branch agreement.
    #[arg(long, default_value = "github/projects.yaml")]
    pub projects: PathBuf,

    /// Lint policy (release and denied templates, host, cursor behaviour).
    #[arg(long)]
    pub policy: Option<PathBuf>,

    /// Log `gh` in with the token in this file before querying.
    #[arg(long)]
    pub token_file: Option<PathBuf>,

    /// Do not query the hosting service.
    #[arg(long)]
    pub skip_remote: bool,

    /// Verbose logging.
    #[arg(long)]
    pub debug: bool,
}

impl CheckArgs {
    pub fn run(self) -> Result<ExitCode> {
        init_tracing(self.debug);

        let registry = loader::load_registry_at(&self.registry)
            .with_context(|| format!("failed to load registry {}", self.registry.display()))?;
        let projects = loader::load_projects_at(&self.projects)
            .with_context(|| format!("failed to load project list {}", self.projects.display()))?;
        let policy = match &self.policy {
            Some(path) => load_policy_at(path)
                .with_context(|| format!("failed to load lint policy {}", path.display()))?,
            None => LintPolicy::default(),
        };

        let lookup = self.branch_lookup();
        let report = run_all(&LintInputs {
            registry_path: &self.registry,
            registry: &registry,
            projects: &projects,
            policy: &policy,
            lookup: lookup.as_ref(),
        });

        print_report(&report);
        if report.had_errors() {
            return Ok(ExitCode::from(1));
        }
        Ok(ExitCode::SUCCESS)
    }

    fn branch_lookup(&self) -> Box<dyn BranchLookup> {
        if self.skip_remote {
            return Box::new(NoRemote::new("remote checks disabled with --skip-remote"));
        }
        match GhCli::locate(self.token_file.clone()) {
            Ok(gh) => Box::new(gh),
            Err(err) => Box::new(NoRemote::new(err.to_string())),
        }
    }
}

fn print_check(check: &CheckOutcome) {
    println!("\n{} {}", "➜".cyan(), check.title.bold());
    for warning in &check.warnings {
        println!("  {} {warning}", "WARNING:".yellow());
    }
    for finding in &check.findings {
        println!("  {} {}", "ERROR:".red(), finding.message);
        for detail in &finding.details {
            println!("    {detail}");
        }
    }
    for note in &check.guidance {
        println!("  * {note}");
    }
    if !check.had_errors() {
        println!("... all fine.");
    }
}

fn print_report(report: &LintReport) {
    for check in &report.checks {
        print_check(check);
    }
    let registry = report.registry.display();
    if report.had_errors() {
        println!("\n{}\n", format!("Found errors in {registry}!").red().bold());
    } else {
        println!("\n{}\n", format!("No errors found in {registry}!").green().bold());
    }
}
