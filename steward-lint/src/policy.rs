//! Lint policy: template sets, host prefix and ordering behaviour.
//!
//! ```yaml
//! release-templates: [publish-to-pypi, release-notes-jobs]
//! denied-templates: [legacy-docs]
//! host: github.com
//! sort-cursor: advance        # or keep-last-valid
//! ```
//!
//! Every key is optional.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;

use crate::error::{io_err, LintError};

pub const DEFAULT_HOST: &str = "github.com";

/// How the ordering check moves its comparison cursor past an offender.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CursorPolicy {
    /// Compare every entry with its immediate predecessor.
    #[default]
    Advance,
    /// Compare with the last entry that was in order, so every entry that
    /// sorts before it is reported.
    KeepLastValid,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct LintPolicy {
    /// Templates that perform a release; a project may use at most one.
    pub release_templates: BTreeSet<String>,
    /// Templates that must not be used at all.
    pub denied_templates: BTreeSet<String>,
    /// Prefix of registry names that live on the hosting service.
    pub host: String,
    pub sort_cursor: CursorPolicy,
}

impl Default for LintPolicy {
    fn default() -> Self {
        Self {
            release_templates: BTreeSet::new(),
            denied_templates: BTreeSet::new(),
            host: DEFAULT_HOST.to_string(),
            sort_cursor: CursorPolicy::default(),
        }
    }
}

impl LintPolicy {
    /// `<host>/` prefix of registry names for `project`.
    pub fn registry_name(&self, project: &str) -> String {
        format!("{}/{project}", self.host)
    }

    /// The `<namespace>/<repo>` part of a registry name on this host.
    /// Anything but exactly two non-empty segments after the host is `None`.
    pub fn strip_host<'a>(&self, registry_name: &'a str) -> Option<&'a str> {
        let rest = registry_name
            .strip_prefix(self.host.as_str())?
            .strip_prefix('/')?;
        match rest.split_once('/') {
            Some((namespace, repo)) if !namespace.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                Some(rest)
            }
            _ => None,
        }
    }
}

/// Load a policy file. A blank file yields the default policy.
pub fn load_policy_at(path: &Path) -> Result<LintPolicy, LintError> {
    if !path.exists() {
        return Err(LintError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    if contents.trim().is_empty() {
        return Ok(LintPolicy::default());
    }
    serde_yaml::from_str(&contents).map_err(|e| LintError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}
