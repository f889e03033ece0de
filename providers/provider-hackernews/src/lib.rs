//! Hacker News provider adapter, backed by Algolia's `search_by_date` API.

pub mod model;
pub mod query;
pub mod search;

pub use model::Entity;
pub use query::Query;

use axol_core::{AdapterError, ParseError, ProviderAdapter, RawRecord, Uid};

pub struct HackerNewsAdapter {
    client: reqwest::blocking::Client,
}

impl Default for HackerNewsAdapter {
    fn default() -> Self {
        HackerNewsAdapter {
            client: search::build_client(),
        }
    }
}

impl HackerNewsAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProviderAdapter for HackerNewsAdapter {
    const PREFIX: &'static str = "hackernews";
    type Query = Query;
    type SearchQuery = String;
    type Entity = Entity;

    fn default_query(&self, text: &str) -> Query {
        Query::string(text)
    }

    fn search(
        &self,
        query: &String,
        limit: Option<usize>,
    ) -> Result<Vec<(Uid, RawRecord)>, AdapterError> {
        search::search(&self.client, query, limit)
    }

    fn parse(&self, data: &RawRecord) -> Result<Entity, ParseError> {
        model::parse(data)
    }
}
