//! Error types for steward-github.

use thiserror::Error;

/// Rejected connection settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid API URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Parsed, but has no path to append endpoints to (`mailto:`, `data:`, ...).
    #[error("API URL '{url}' cannot be used as a base URL")]
    NotABase { url: String },
}
