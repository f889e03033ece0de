//! Pinboard provider adapter: bookmarks scraped from the site's search page (HTML
//! with an embedded JSON payload), with a regular and a tag kind fanned out per query.

pub mod model;
pub mod query;
pub mod search;

pub use model::Bookmark;
pub use query::Query;

use axol_core::{AdapterError, ParseError, ProviderAdapter, RawRecord, Uid};
use query::SearchQuery;
use search::PinboardClient;

pub struct PinboardAdapter {
    client: PinboardClient,
}

impl PinboardAdapter {
    pub fn new() -> Result<Self, AdapterError> {
        Ok(PinboardAdapter {
            client: PinboardClient::new()?,
        })
    }
}

impl ProviderAdapter for PinboardAdapter {
    const PREFIX: &'static str = "pinboard";
    type Query = Query;
    type SearchQuery = SearchQuery;
    type Entity = Bookmark;

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

    fn parse(&self, data: &RawRecord) -> Result<Bookmark, ParseError> {
        model::parse(data)
    }
}
