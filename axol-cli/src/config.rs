//! User configuration contract: declares where a feed's SQLite store lives and
//! which feeds exist (`storage_dir()` + `feeds()`).

use axol_core::{AnyFeed, Feed, ProviderAdapter};
use axol_credentials::{Credentials, TomlCredentials, UnconfiguredCredentials};
use axol_storage::{OpenMode, Store};
use provider_github::{GithubAdapter, Kind as GithubKind, Query as GithubQuery};
use provider_hackernews::HackerNewsAdapter;
use provider_lobsters::LobstersAdapter;
use provider_pinboard::PinboardAdapter;
use provider_reddit::RedditAdapter;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub trait UserConfig {
    fn storage_dir(&self) -> PathBuf;
    fn feeds(&self) -> Result<Vec<Box<dyn AnyFeed>>, ConfigLoadError>;
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file {path}: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unknown provider {0:?} in feed declaration")]
    UnknownProvider(String),
    #[error("unknown github kind {0:?}")]
    UnknownKind(String),
    #[error(transparent)]
    Adapter(#[from] axol_core::AdapterError),
    #[error(transparent)]
    Credentials(#[from] axol_credentials::CredentialsError),
    #[error(transparent)]
    Store(#[from] axol_storage::StoreError),
    #[error(transparent)]
    FeedName(#[from] axol_core::FeedNameError),
    #[error("github kind filter error: {0}")]
    GithubKindFilter(#[from] provider_github::query::KindFilterError),
}

#[derive(Debug, Deserialize)]
struct FeedDecl {
    provider: String,
    name: String,
    query: String,
    #[serde(default)]
    include_kinds: Vec<String>,
    #[serde(default)]
    exclude_kinds: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    storage_dir: PathBuf,
    credentials_path: Option<PathBuf>,
    #[serde(default, rename = "feed")]
    feeds: Vec<FeedDecl>,
}

fn parse_github_kind(s: &str) -> Result<GithubKind, ConfigLoadError> {
    match s {
        "code" => Ok(GithubKind::Code),
        "commit" => Ok(GithubKind::Commit),
        "issue" => Ok(GithubKind::Issue),
        "repository" => Ok(GithubKind::Repository),
        other => Err(ConfigLoadError::UnknownKind(other.to_string())),
    }
}

/// Production `UserConfig`: a single TOML file declaring the storage directory,
/// optional credentials file, and a `[[feed]]` table per watched query.
pub struct TomlUserConfig {
    file: ConfigFile,
}

impl TomlUserConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let file: ConfigFile = toml::from_str(&text)?;
        Ok(TomlUserConfig { file })
    }

    /// `$XDG_CONFIG_HOME/axol/config.toml` (teacher's `Config::default_config_path`
    /// pattern via `directories::ProjectDirs`).
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "axol", "axol")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    fn credentials(&self) -> Result<Box<dyn Credentials>, ConfigLoadError> {
        match &self.file.credentials_path {
            Some(p) => Ok(Box::new(TomlCredentials::load(p)?)),
            None => Ok(Box::new(UnconfiguredCredentials)),
        }
    }

    fn open_store(&self, decl: &FeedDecl) -> Result<Store, ConfigLoadError> {
        let path = self
            .storage_dir()
            .join(format!("{}_{}.sqlite", decl.provider, decl.name));
        Ok(Store::open(&path, OpenMode::Writable)?)
    }
}

impl UserConfig for TomlUserConfig {
    fn storage_dir(&self) -> PathBuf {
        self.file.storage_dir.clone()
    }

    fn feeds(&self) -> Result<Vec<Box<dyn AnyFeed>>, ConfigLoadError> {
        let creds = self.credentials()?;
        let mut out: Vec<Box<dyn AnyFeed>> = Vec::new();

        for decl in &self.file.feeds {
            let store = self.open_store(decl)?;
            match decl.provider.as_str() {
                "hackernews" => {
                    let adapter = HackerNewsAdapter::new();
                    let query = adapter.default_query(&decl.query);
                    let feed = Feed::new(&decl.name, adapter, vec![query], store, None)?;
                    out.push(Box::new(feed));
                }
                "reddit" => {
                    let adapter = RedditAdapter::new(&creds.reddit()?)?;
                    let query = adapter.default_query(&decl.query);
                    let feed = Feed::new(&decl.name, adapter, vec![query], store, None)?;
                    out.push(Box::new(feed));
                }
                "github" => {
                    let adapter = GithubAdapter::new(&creds.github()?)?;
                    let mut query = GithubQuery::string(decl.query.clone());
                    if !decl.include_kinds.is_empty() {
                        let kinds = decl
                            .include_kinds
                            .iter()
                            .map(|s| parse_github_kind(s))
                            .collect::<Result<Vec<_>, _>>()?;
                        query = query.with_included(kinds)?;
                    } else if !decl.exclude_kinds.is_empty() {
                        let kinds = decl
                            .exclude_kinds
                            .iter()
                            .map(|s| parse_github_kind(s))
                            .collect::<Result<Vec<_>, _>>()?;
                        query = query.with_excluded(kinds)?;
                    }
                    let feed = Feed::new(&decl.name, adapter, vec![query], store, None)?;
                    out.push(Box::new(feed));
                }
                "lobsters" => {
                    let adapter = LobstersAdapter::new()?;
                    let query = adapter.default_query(&decl.query);
                    let feed = Feed::new(&decl.name, adapter, vec![query], store, None)?;
                    out.push(Box::new(feed));
                }
                "pinboard" => {
                    let adapter = PinboardAdapter::new()?;
                    let query = adapter.default_query(&decl.query);
                    let feed = Feed::new(&decl.name, adapter, vec![query], store, None)?;
                    out.push(Box::new(feed));
                }
                other => return Err(ConfigLoadError::UnknownProvider(other.to_string())),
            }
        }

        Ok(out)
    }
}
