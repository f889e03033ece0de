//! Feed registry: holds every feed the user's configuration declares and filters
//! them by anchored include/exclude regex over a flat `Vec`, rather than looking feeds
//! up by exact id.

use axol_core::AnyFeed;
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("--include and --exclude are mutually exclusive")]
    MutuallyExclusiveFilters,
    #[error("no feeds matched the given filter")]
    NoFeedsMatched,
}

pub struct FeedRegistry {
    feeds: Vec<Box<dyn AnyFeed>>,
}

/// A pattern is considered a match only if it matches starting at position 0 of the
/// name (`re.match` semantics, not `re.search`).
fn anchored_match(re: &Regex, name: &str) -> bool {
    re.find(name).map(|m| m.start() == 0).unwrap_or(false)
}

impl FeedRegistry {
    pub fn new(feeds: Vec<Box<dyn AnyFeed>>) -> Self {
        FeedRegistry { feeds }
    }

    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }

    pub fn get_feeds(
        &self,
        include: Option<&Regex>,
        exclude: Option<&Regex>,
    ) -> Result<Vec<&dyn AnyFeed>, ConfigError> {
        if include.is_some() && exclude.is_some() {
            return Err(ConfigError::MutuallyExclusiveFilters);
        }

        let matched: Vec<&dyn AnyFeed> = self
            .feeds
            .iter()
            .map(|f| f.as_ref())
            .filter(|f| match (include, exclude) {
                (Some(re), None) => anchored_match(re, f.name()),
                (None, Some(re)) => !anchored_match(re, f.name()),
                (None, None) => true,
                (Some(_), Some(_)) => unreachable!("checked above"),
            })
            .collect();

        if matched.is_empty() {
            return Err(ConfigError::NoFeedsMatched);
        }
        Ok(matched)
    }
}
