//! Hosting-service credentials.
//!
//! Read from an INI file with a `[github]` section, then overlaid with
//! `STEWARD_GITHUB__*` environment variables:
//!
//! ```ini
//! [github]
//! token = ghp_...
//! url = https://api.github.com
//! timeout = 30
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use steward_github::{parse_api_url, GitHubSettings, DEFAULT_API_URL, DEFAULT_TIMEOUT};

pub const DEFAULT_CREDENTIALS_FILE: &str = "~/.github-projects.config";

#[derive(Debug, Default, Deserialize)]
struct CredentialsFile {
    #[serde(default)]
    github: GitHubSection,
}

#[derive(Debug, Default, Deserialize)]
struct GitHubSection {
    token: Option<String>,
    url: Option<String>,
    timeout: Option<u64>,
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> Result<PathBuf> {
    match path.strip_prefix("~") {
        Ok(rest) => {
            let home = dirs::home_dir().context("could not determine home directory")?;
            Ok(home.join(rest))
        }
        Err(_) => Ok(path.to_path_buf()),
    }
}

/// Build client settings from `path` (optional on disk) and the environment.
pub fn load_credentials(path: &Path) -> Result<GitHubSettings> {
    let built = config::Config::builder()
        .add_source(config::File::from(path).format(config::FileFormat::Ini).required(false))
        .add_source(
            config::Environment::with_prefix("STEWARD")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .with_context(|| format!("failed to read credentials from {}", path.display()))?;
    let file: CredentialsFile = built
        .try_deserialize()
        .with_context(|| format!("invalid credentials in {}", path.display()))?;

    let section = file.github;
    let token = match section.token.map(|t| t.trim().to_string()) {
        Some(token) if !token.is_empty() => token,
        _ => bail!(
            "no GitHub token: set `token` in the [github] section of {} or STEWARD_GITHUB__TOKEN",
            path.display()
        ),
    };
    let api_url = parse_api_url(section.url.as_deref().unwrap_or(DEFAULT_API_URL))
        .with_context(|| format!("invalid `url` in the [github] section of {}", path.display()))?;
    tracing::debug!(path = %path.display(), api_url = %api_url, "loaded credentials");

    Ok(GitHubSettings {
        token,
        api_url,
        timeout: section.timeout.map_or(DEFAULT_TIMEOUT, Duration::from_secs),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn ini_section_is_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("creds.config");
        std::fs::write(&path, "[github]\ntoken = abc123\nurl = https://ghe.example.com/api/v3\ntimeout = 5\n").unwrap();

        let settings = load_credentials(&path).unwrap();
        assert_eq!(settings.token, "abc123");
        assert_eq!(settings.api_url.as_str(), "https://ghe.example.com/api/v3");
        assert_eq!(settings.timeout, Duration::from_secs(5));
    }

    #[test]
    fn missing_url_defaults_to_public_api() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("creds.config");
        std::fs::write(&path, "[github]\ntoken = abc123\n").unwrap();

        let settings = load_credentials(&path).unwrap();
        assert_eq!(settings.api_url.as_str(), "https://api.github.com/");
        assert_eq!(settings.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn malformed_url_fails_at_load_time() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("creds.config");
        std::fs::write(&path, "[github]\ntoken = abc123\nurl = ghe.example.com/api/v3\n").unwrap();

        let err = load_credentials(&path).unwrap_err();
        assert!(format!("{err:#}").contains("invalid `url` in the [github] section"), "{err:#}");
    }

    #[test]
    fn tilde_is_expanded() {
        let expanded = expand_home(Path::new("~/.github-projects.config")).unwrap();
        assert!(!expanded.starts_with("~"));
        assert!(expanded.ends_with(".github-projects.config"));
        assert_eq!(expand_home(Path::new("rel/file")).unwrap(), PathBuf::from("rel/file"));
    }
}
