//! GitHub REST implementation of the [`HostingService`](steward_reconcile::HostingService) port.
//!
//! Blocking, one request per call, built on a single `ureq` agent.

pub mod client;
pub mod error;
pub mod wire;

pub use client::{parse_api_url, GitHubClient, GitHubSettings, DEFAULT_API_URL, DEFAULT_TIMEOUT};
pub use error::SettingsError;
