//! # steward-lint
//!
//! Consistency checks over the CI pipeline registry.
//!
//! Every check runs regardless of the others and reports all of its
//! findings. [`run_all`] combines them into one [`LintReport`] whose
//! [`had_errors`](LintReport::had_errors) becomes the process exit status.

pub mod checks;
pub mod error;
pub mod policy;
pub mod remote;
pub mod report;

pub use checks::{run_all, LintInputs};
pub use error::{GhError, LintError};
pub use policy::{load_policy_at, CursorPolicy, LintPolicy};
pub use remote::{BranchLookup, GhCli, NoRemote, Readiness};
pub use report::{CheckOutcome, Finding, LintReport};
