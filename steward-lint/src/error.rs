//! Error types for steward-lint.

use std::path::PathBuf;

use thiserror::Error;

/// Failures loading lint inputs.
#[derive(Debug, Error)]
pub enum LintError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse lint policy at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("lint policy not found at {path}")]
    NotFound { path: PathBuf },
}

/// Failures talking to the `gh` command.
#[derive(Debug, Error)]
pub enum GhError {
    #[error("gh command not available")]
    NotInstalled,

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("`gh {command}` exited with {}: {stderr}", exit_label(.code))]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> LintError {
    LintError::Io {
        path: path.into(),
        source,
    }
}
