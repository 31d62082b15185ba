//! Blocking GitHub REST client.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use steward_core::RemoteRepository;
use steward_reconcile::{
    Branch, CreateRepository, HostingService, Lookup, Namespace, ObservedProtection,
    ProtectionPatch, ProtectionRules, RemoteError, RepoPatch, RepoRef,
};

use crate::error::SettingsError;
use crate::wire::{
    BranchResponse, ContextsBody, ErrorBody, Organization, ProtectionBody, ProtectionResponse,
};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const PAGE_SIZE: usize = 100;
const USER_AGENT: &str = concat!("steward/", env!("CARGO_PKG_VERSION"));

/// Parse an API root such as `https://ghe.example.com/api/v3`.
pub fn parse_api_url(raw: &str) -> Result<Url, SettingsError> {
    let url = Url::parse(raw.trim()).map_err(|source| SettingsError::InvalidUrl {
        url: raw.to_string(),
        source,
    })?;
    if url.cannot_be_a_base() {
        return Err(SettingsError::NotABase {
            url: raw.to_string(),
        });
    }
    Ok(url)
}

/// Connection settings for [`GitHubClient`].
#[derive(Debug, Clone)]
pub struct GitHubSettings {
    pub token: String,
    pub api_url: Url,
    pub timeout: Duration,
}

impl GitHubSettings {
    pub fn new(token: impl Into<String>, api_url: Url) -> Self {
        Self {
            token: token.into(),
            api_url,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// [`HostingService`] backed by the GitHub REST API.
pub struct GitHubClient {
    agent: ureq::Agent,
    base: Url,
    token: String,
}

impl GitHubClient {
    pub fn new(settings: &GitHubSettings) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(settings.timeout)
            .user_agent(USER_AGENT)
            .build();
        Self {
            agent,
            base: settings.api_url.clone(),
            token: settings.token.clone(),
        }
    }

    /// `segments` appended to the API root, each percent-encoded on its own.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // parse_api_url rejects cannot-be-a-base URLs
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn repo_url(&self, repo: &RepoRef) -> Url {
        self.endpoint(&["repos", repo.owner.as_str(), repo.name.as_str()])
    }

    /// Branch names keep their `/` separators; the API accepts them unescaped.
    fn branch_url(&self, repo: &RepoRef, branch: &str, tail: &[&str]) -> Url {
        let mut segments = vec!["repos", repo.owner.as_str(), repo.name.as_str(), "branches"];
        segments.extend(branch.split('/'));
        segments.extend_from_slice(tail);
        self.endpoint(&segments)
    }

    fn request(&self, method: &'static str, url: &Url) -> ureq::Request {
        self.agent
            .request_url(method, url)
            .set("Authorization", &format!("token {}", self.token))
            .set("Accept", "application/vnd.github+json")
    }

    /// GET that maps 404 to [`Lookup::NotFound`].
    fn fetch<T: DeserializeOwned>(&self, url: &Url) -> Result<Lookup<T>, RemoteError> {
        tracing::debug!(url = %url, "GET");
        match self.request("GET", url).call() {
            Ok(response) => decode(url, response).map(Lookup::Found),
            Err(ureq::Error::Status(404, _)) => Ok(Lookup::NotFound),
            Err(err) => Err(remote_error("GET", url, err)),
        }
    }

    fn fetch_required<T: DeserializeOwned>(&self, url: &Url) -> Result<T, RemoteError> {
        tracing::debug!(url = %url, "GET");
        let response = self
            .request("GET", url)
            .call()
            .map_err(|err| remote_error("GET", url, err))?;
        decode(url, response)
    }

    fn send<B: Serialize>(
        &self,
        method: &'static str,
        url: &Url,
        body: &B,
    ) -> Result<ureq::Response, RemoteError> {
        let payload = serde_json::to_value(body).map_err(|e| RemoteError::Decode {
            url: url.to_string(),
            message: format!("failed to encode request body: {e}"),
        })?;
        tracing::debug!(url = %url, body = %payload, "{method}");
        self.request(method, url)
            .send_json(payload)
            .map_err(|err| remote_error(method, url, err))
    }

    fn send_empty(&self, method: &'static str, url: &Url) -> Result<(), RemoteError> {
        tracing::debug!(url = %url, "{method}");
        self.request(method, url)
            .call()
            .map(drop)
            .map_err(|err| remote_error(method, url, err))
    }
}

impl HostingService for GitHubClient {
    fn namespaces(&self) -> Result<Vec<Namespace>, RemoteError> {
        let mut namespaces = Vec::new();
        for page in 1.. {
            let mut url = self.endpoint(&["user", "orgs"]);
            url.query_pairs_mut()
                .append_pair("per_page", &PAGE_SIZE.to_string())
                .append_pair("page", &page.to_string());
            let orgs: Vec<Organization> = self.fetch_required(&url)?;
            let last = orgs.len() < PAGE_SIZE;
            namespaces.extend(orgs.into_iter().map(Namespace::from));
            if last {
                break;
            }
        }
        Ok(namespaces)
    }

    fn get_repository(&self, repo: &RepoRef) -> Result<Lookup<RemoteRepository>, RemoteError> {
        self.fetch(&self.repo_url(repo))
    }

    fn create_repository(
        &self,
        namespace: &Namespace,
        request: &CreateRepository,
    ) -> Result<RemoteRepository, RemoteError> {
        let url = self.endpoint(&["orgs", namespace.login.as_str(), "repos"]);
        let response = self.send("POST", &url, request)?;
        decode(&url, response)
    }

    fn update_repository(&self, repo: &RepoRef, patch: &RepoPatch) -> Result<(), RemoteError> {
        self.send("PATCH", &self.repo_url(repo), patch).map(drop)
    }

    fn get_branch(&self, repo: &RepoRef, branch: &str) -> Result<Lookup<Branch>, RemoteError> {
        let found: Lookup<BranchResponse> = self.fetch(&self.branch_url(repo, branch, &[]))?;
        Ok(match found {
            Lookup::Found(raw) => Lookup::Found(raw.into()),
            Lookup::NotFound => Lookup::NotFound,
        })
    }

    fn get_branch_protection(
        &self,
        repo: &RepoRef,
        branch: &str,
    ) -> Result<Lookup<ObservedProtection>, RemoteError> {
        let url = self.branch_url(repo, branch, &["protection"]);
        let found: Lookup<ProtectionResponse> = self.fetch(&url)?;
        Ok(match found {
            Lookup::Found(raw) => Lookup::Found(raw.into()),
            Lookup::NotFound => Lookup::NotFound,
        })
    }

    fn create_branch_protection(
        &self,
        repo: &RepoRef,
        branch: &str,
        rules: &ProtectionRules,
    ) -> Result<(), RemoteError> {
        let url = self.branch_url(repo, branch, &["protection"]);
        self.send("PUT", &url, &ProtectionBody::from(rules)).map(drop)
    }

    /// One call per changed field; a failure after the first call reports
    /// what already went through as [`RemoteError::PartiallyApplied`].
    fn update_branch_protection(
        &self,
        repo: &RepoRef,
        branch: &str,
        patch: &ProtectionPatch,
    ) -> Result<(), RemoteError> {
        let mut applied = Vec::new();
        if let Some(enforce_admins) = patch.enforce_admins {
            let url = self.branch_url(repo, branch, &["protection", "enforce_admins"]);
            let method = if enforce_admins { "POST" } else { "DELETE" };
            self.send_empty(method, &url)?;
            applied.push("enforce_admins");
        }
        if let Some(contexts) = &patch.contexts {
            let url = self.branch_url(repo, branch, &["protection", "required_status_checks"]);
            if let Err(err) = self.send("PATCH", &url, &ContextsBody { contexts }) {
                if applied.is_empty() {
                    return Err(err);
                }
                tracing::warn!(
                    repo = %repo,
                    branch,
                    applied = ?applied,
                    "branch protection only partially updated"
                );
                return Err(RemoteError::PartiallyApplied {
                    applied,
                    source: Box::new(err),
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn decode<T: DeserializeOwned>(url: &Url, response: ureq::Response) -> Result<T, RemoteError> {
    response.into_json().map_err(|e| RemoteError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}

fn remote_error(method: &'static str, url: &Url, err: ureq::Error) -> RemoteError {
    match err {
        ureq::Error::Status(status, response) => status_error(
            method,
            url.as_str(),
            status,
            &response.into_string().unwrap_or_default(),
        ),
        ureq::Error::Transport(transport) => RemoteError::Transport {
            method,
            url: url.to_string(),
            message: transport.to_string(),
        },
    }
}

/// Error for a non-success status, preferring the API's own message.
fn status_error(method: &'static str, url: &str, status: u16, body: &str) -> RemoteError {
    let message = match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.message,
        Err(_) if body.trim().is_empty() => "no response body".to_string(),
        Err(_) => body.trim().to_string(),
    };
    RemoteError::Status {
        method,
        url: url.to_string(),
        status,
        message,
    }
}
