//! Error types for steward-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while loading desired-state files.
///
/// Every variant is a configuration problem: callers treat them as fatal.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Underlying I/O failure, annotated with the file being read.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error with the file path and serde_yaml line context.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The requested file did not exist.
    #[error("file not found at {path}")]
    NotFound { path: PathBuf },

    /// A project identifier did not have the `namespace/name` shape.
    #[error("invalid project identifier '{0}': expected 'namespace/name'")]
    InvalidProjectId(String),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> LoadError {
    LoadError::Io {
        path: path.into(),
        source,
    }
}
