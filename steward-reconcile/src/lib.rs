//! # steward-reconcile
//!
//! Computes and applies the minimal set of mutations that bring a hosting
//! service into line with the desired-state project list.
//!
//! Call [`reconcile_all`] to process a whole project list, or drive a
//! [`Reconciler`] one project at a time. The hosting service is reached only
//! through the [`HostingService`] port.

pub mod diff;
pub mod error;
pub mod protection;
pub mod reconciler;
pub mod service;

#[cfg(test)]
mod memory;

pub use diff::{diff, RepoPatch};
pub use error::{ReconcileError, RemoteError};
pub use protection::{
    diff_protection, reconcile_protection, ObservedProtection, ProtectionOutcome,
    ProtectionPatch, ProtectionRules, StatusChecks,
};
pub use reconciler::{reconcile_all, BranchReport, ProjectOutcome, ProjectReport, Reconciler};
pub use service::{
    Branch, CreateRepository, HostingService, Lookup, Namespace, NamespaceIndex, RepoRef,
};
