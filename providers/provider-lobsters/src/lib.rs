//! Lobsters provider adapter: stories and comments scraped from the site's search
//! page, fanned out across sort orders and merged by uid.

pub mod model;
pub mod query;
pub mod search;

pub use model::Entity;
pub use query::{Kind, Query};

use axol_core::{AdapterError, ParseError, ProviderAdapter, RawRecord, Uid};
use query::SearchQuery;
use search::LobstersClient;

pub struct LobstersAdapter {
    client: LobstersClient,
}

impl LobstersAdapter {
    pub fn new() -> Result<Self, AdapterError> {
        Ok(LobstersAdapter {
            client: LobstersClient::new()?,
        })
    }
}

impl ProviderAdapter for LobstersAdapter {
    const PREFIX: &'static str = "lobsters";
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
