//! Remote default-branch lookup through the `gh` command.

use std::fs::File;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::error::GhError;

/// Whether a lookup can be used for this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    /// The check is skipped; the reason becomes a warning.
    Unavailable(String),
}

/// Source of truth for repository default branches.
pub trait BranchLookup {
    /// Authenticate or otherwise get ready. Called once before any lookup.
    fn prepare(&self) -> Readiness;

    /// Default branch of `repo` (`<namespace>/<name>`).
    fn default_branch(&self, repo: &str) -> Result<String, GhError>;
}

/// Lookup that is never available.
#[derive(Debug, Clone)]
pub struct NoRemote {
    reason: String,
}

impl NoRemote {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl BranchLookup for NoRemote {
    fn prepare(&self) -> Readiness {
        Readiness::Unavailable(self.reason.clone())
    }

    fn default_branch(&self, _repo: &str) -> Result<String, GhError> {
        Err(GhError::NotInstalled)
    }
}

/// The GitHub CLI, optionally logged in with a token file first.
#[derive(Debug, Clone)]
pub struct GhCli {
    program: PathBuf,
    token_file: Option<PathBuf>,
}

impl GhCli {
    /// Find `gh` on `PATH`.
    pub fn locate(token_file: Option<PathBuf>) -> Result<Self, GhError> {
        let program = which::which("gh").map_err(|_| GhError::NotInstalled)?;
        Ok(Self::with_program(program, token_file))
    }

    pub fn with_program(program: impl Into<PathBuf>, token_file: Option<PathBuf>) -> Self {
        Self {
            program: program.into(),
            token_file,
        }
    }

    fn run(&self, args: &[&str], stdin: Option<File>) -> Result<String, GhError> {
        tracing::debug!(program = %self.program.display(), args = ?args, "running gh");
        let output = Command::new(&self.program)
            .args(args)
            .stdin(stdin.map_or_else(Stdio::null, Stdio::from))
            .output()
            .map_err(|source| GhError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(GhError::Failed {
                command: args.join(" "),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl BranchLookup for GhCli {
    fn prepare(&self) -> Readiness {
        if let Some(path) = &self.token_file {
            let token = match File::open(path) {
                Ok(file) => file,
                Err(err) => {
                    return Readiness::Unavailable(format!(
                        "cannot read token file {}: {err}",
                        path.display()
                    ))
                }
            };
            if let Err(err) = self.run(&["auth", "login", "--with-token"], Some(token)) {
                return Readiness::Unavailable(format!("gh auth login failed: {err}"));
            }
        }
        match self.run(&["auth", "status"], None) {
            Ok(_) => Readiness::Ready,
            Err(GhError::Spawn { .. }) => Readiness::Unavailable(GhError::NotInstalled.to_string()),
            Err(err) => Readiness::Unavailable(format!("gh command is not configured: {err}")),
        }
    }

    fn default_branch(&self, repo: &str) -> Result<String, GhError> {
        let out = self.run(
            &[
                "repo",
                "view",
                repo,
                "--json",
                "defaultBranchRef",
                "--jq",
                ".defaultBranchRef.name",
            ],
            None,
        )?;
        Ok(out.trim_end().to_string())
    }
}
