//! Credential loading contract: the core and provider adapters only need
//! `GithubCredentials`/`RedditCredentials` values and the `Credentials` trait that
//! produces them; how they are sourced (TOML file, env vars, a secrets manager) is left
//! to the binding crate.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Deserialize)]
pub struct GithubCredentials {
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub user_agent: String,
}

#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("credentials not configured for {0}")]
    NotConfigured(&'static str),
    #[error("failed to read credentials file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse credentials file: {0}")]
    Parse(#[from] toml::de::Error),
}

pub trait Credentials: Send + Sync {
    fn github(&self) -> Result<GithubCredentials, CredentialsError>;
    fn reddit(&self) -> Result<RedditCredentials, CredentialsError>;
}

/// Always-errors implementation, useful as a placeholder until a real credentials
/// source is wired in.
#[derive(Debug, Default)]
pub struct UnconfiguredCredentials;

impl Credentials for UnconfiguredCredentials {
    fn github(&self) -> Result<GithubCredentials, CredentialsError> {
        Err(CredentialsError::NotConfigured("github"))
    }

    fn reddit(&self) -> Result<RedditCredentials, CredentialsError> {
        Err(CredentialsError::NotConfigured("reddit"))
    }
}

#[derive(Debug, Deserialize, Default)]
struct CredentialsFile {
    github: Option<GithubCredentials>,
    reddit: Option<RedditCredentials>,
}

/// Reads both providers' credentials from one TOML file, e.g.:
/// ```toml
/// [github]
/// token = "ghp_..."
///
/// [reddit]
/// client_id = "..."
/// client_secret = "..."
/// username = "..."
/// password = "..."
/// user_agent = "axol/0.1 by u/example"
/// ```
pub struct TomlCredentials(CredentialsFile);

impl TomlCredentials {
    pub fn load(path: &Path) -> Result<Self, CredentialsError> {
        let text = std::fs::read_to_string(path).map_err(|source| CredentialsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let file: CredentialsFile = toml::from_str(&text)?;
        Ok(TomlCredentials(file))
    }
}

impl Credentials for TomlCredentials {
    fn github(&self) -> Result<GithubCredentials, CredentialsError> {
        self.0
            .github
            .clone()
            .ok_or(CredentialsError::NotConfigured("github"))
    }

    fn reddit(&self) -> Result<RedditCredentials, CredentialsError> {
        self.0
            .reddit
            .clone()
            .ok_or(CredentialsError::NotConfigured("reddit"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_always_errors() {
        let c = UnconfiguredCredentials;
        assert!(c.github().is_err());
        assert!(c.reddit().is_err());
    }

    #[test]
    fn toml_credentials_parse_partial_file() {
        let dir = tempfile_dir();
        let path = dir.join("creds.toml");
        std::fs::write(
            &path,
            r#"
            [github]
            token = "ghp_abc"
            "#,
        )
        .unwrap();
        let creds = TomlCredentials::load(&path).unwrap();
        assert_eq!(creds.github().unwrap().token, "ghp_abc");
        assert!(creds.reddit().is_err());
    }

    fn tempfile_dir() -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("axol-credentials-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
