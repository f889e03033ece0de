//! GitHub provider adapter: code, commits, issues/pull requests, and repositories,
//! fanned out across every `(sort, order)` pair per kind and merged by uid.

pub mod model;
pub mod query;
pub mod search;

pub use model::Entity;
pub use query::{Kind, Query, SearchQuery};

use axol_core::{AdapterError, ParseError, ProviderAdapter, RawRecord, Uid};
use axol_credentials::GithubCredentials;
use search::GithubClient;

pub struct GithubAdapter {
    client: GithubClient,
}

impl GithubAdapter {
    pub fn new(creds: &GithubCredentials) -> Result<Self, AdapterError> {
        Ok(GithubAdapter {
            client: GithubClient::new(&creds.token)?,
        })
    }
}

impl ProviderAdapter for GithubAdapter {
    const PREFIX: &'static str = "github";
    type Query = Query;
    type SearchQuery = SearchQuery;
    type Entity = Entity;

    fn default_query(&self, text: &str) -> Query {
        Query::string(text)
    }

    fn search(
        &self,
        query: &SearchQuery,
        limit: Option<usize>,
    ) -> Result<Vec<(Uid, RawRecord)>, AdapterError> {
        self.client.search(query, limit)
    }

    fn parse(&self, data: &RawRecord) -> Result<Entity, ParseError> {
        model::parse(data)
    }
}
