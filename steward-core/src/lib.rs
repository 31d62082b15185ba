//! Steward core library: desired-state domain types, loaders, errors.
//!
//! - [`types`]: project specs, desired/observed repository state, branch rules
//! - [`registry`]: CI pipeline registry entries
//! - [`loader`]: YAML loaders for the project list, ACL files and registry
//! - [`error`]: [`LoadError`]

pub mod error;
pub mod loader;
pub mod registry;
pub mod types;

pub use error::LoadError;
pub use loader::{AclDirectory, ProtectionSource};
pub use registry::{Job, JobOptions, PipelineKind, RegistryEntry, RegistryProject};
pub use types::{
    BranchProtectionSpec, DesiredRepoConfig, ProjectId, ProjectSpec, RemoteRepository,
    RepoOption, DEFAULT_BRANCH,
};
