//! Error types for steward-reconcile.

use thiserror::Error;

use steward_core::{LoadError, ProjectId};

/// Failures reported by a [`HostingService`](crate::HostingService)
/// implementation. "Not found" is never an error; see [`Lookup`](crate::Lookup).
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The service answered with a non-success status.
    #[error("{method} {url} returned HTTP {status}: {message}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
        message: String,
    },

    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[error("{method} {url} failed: {message}")]
    Transport {
        method: &'static str,
        url: String,
        message: String,
    },

    /// A response body did not match the expected shape.
    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    /// A multi-call update failed after some of its calls went through.
    #[error("{source} (already applied: {})", applied.join(", "))]
    PartiallyApplied {
        applied: Vec<&'static str>,
        #[source]
        source: Box<RemoteError>,
    },
}

/// All errors that can arise while reconciling.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The project's owner is not among the namespaces visible to the token.
    #[error("namespace '{namespace}' of {project} is not accessible with the configured credentials")]
    NamespaceNotFound { project: ProjectId, namespace: String },

    /// A desired-state file could not be loaded.
    #[error("failed to load desired state: {0}")]
    Load(#[from] LoadError),

    /// A hosting API call failed.
    #[error("{context}: {source}")]
    Remote {
        context: String,
        #[source]
        source: RemoteError,
    },

    /// An ACL entry names a branch the repository does not have.
    #[error("branch '{branch}' does not exist in {repo}")]
    BranchNotFound { repo: String, branch: String },
}

impl ReconcileError {
    /// Fatal errors abort the whole run; the rest are recorded per project.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ReconcileError::NamespaceNotFound { .. } | ReconcileError::Load(_)
        )
    }
}

/// Convenience constructor for [`ReconcileError::Remote`].
pub(crate) fn remote_err(context: impl Into<String>, source: RemoteError) -> ReconcileError {
    ReconcileError::Remote {
        context: context.into(),
        source,
    }
}
