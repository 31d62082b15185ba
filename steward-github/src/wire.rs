//! Request and response bodies of the GitHub REST endpoints in use.
//!
//! Unknown response fields are ignored; only what the reconciler compares is
//! kept.

use serde::{Deserialize, Serialize};

use steward_reconcile::{Branch, Namespace, ObservedProtection, ProtectionRules, StatusChecks};

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Element of `GET /user/orgs`.
#[derive(Debug, Deserialize)]
pub struct Organization {
    pub login: String,
}

impl From<Organization> for Namespace {
    fn from(org: Organization) -> Self {
        Namespace::new(org.login)
    }
}

/// `GET /repos/{owner}/{repo}/branches/{branch}`.
#[derive(Debug, Deserialize)]
pub struct BranchResponse {
    pub name: String,
    #[serde(default)]
    pub protected: bool,
}

impl From<BranchResponse> for Branch {
    fn from(branch: BranchResponse) -> Self {
        Branch {
            name: branch.name,
            protected: branch.protected,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct EnabledFlag {
    #[serde(default)]
    pub enabled: bool,
}

/// `GET /repos/{owner}/{repo}/branches/{branch}/protection`.
#[derive(Debug, Deserialize)]
pub struct ProtectionResponse {
    #[serde(default)]
    pub enforce_admins: Option<EnabledFlag>,
    #[serde(default)]
    pub required_status_checks: Option<StatusChecks>,
}

impl From<ProtectionResponse> for ObservedProtection {
    fn from(raw: ProtectionResponse) -> Self {
        ObservedProtection {
            enforce_admins: raw.enforce_admins.is_some_and(|flag| flag.enabled),
            required_status_checks: raw.required_status_checks,
        }
    }
}

/// Error document returned with non-success statuses.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct RequiredChecksBody<'a> {
    pub strict: bool,
    pub contexts: &'a [String],
}

/// `PUT /repos/{owner}/{repo}/branches/{branch}/protection`.
///
/// The endpoint requires every top-level key; rules this tool does not manage
/// are sent as `null`.
#[derive(Debug, Serialize)]
pub struct ProtectionBody<'a> {
    pub required_status_checks: Option<RequiredChecksBody<'a>>,
    pub enforce_admins: bool,
    pub required_pull_request_reviews: Option<()>,
    pub restrictions: Option<()>,
}

impl<'a> From<&'a ProtectionRules> for ProtectionBody<'a> {
    fn from(rules: &'a ProtectionRules) -> Self {
        Self {
            required_status_checks: rules.contexts.as_deref().map(|contexts| RequiredChecksBody {
                strict: false,
                contexts,
            }),
            enforce_admins: rules.enforce_admins,
            required_pull_request_reviews: None,
            restrictions: None,
        }
    }
}

/// `PATCH .../protection/required_status_checks`.
#[derive(Debug, Serialize)]
pub struct ContextsBody<'a> {
    pub contexts: &'a [String],
}
