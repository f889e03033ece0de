//! Reddit provider adapter: submissions only, searched under every sort order and
//! merged by uid to work around the search API's per-sort truncation.

pub mod model;
pub mod query;
pub mod search;

pub use model::Submission;
pub use query::Query;

use axol_core::{AdapterError, ParseError, ProviderAdapter, RawRecord, Uid};
use axol_credentials::RedditCredentials;
use search::RedditClient;

pub struct RedditAdapter {
    client: RedditClient,
}

impl RedditAdapter {
    pub fn new(creds: &RedditCredentials) -> Result<Self, AdapterError> {
        Ok(RedditAdapter {
            client: RedditClient::authenticate(creds)?,
        })
    }
}

impl ProviderAdapter for RedditAdapter {
    const PREFIX: &'static str = "reddit";
    type Query = Query;
    type SearchQuery = String;
    type Entity = Submission;

    fn default_query(&self, text: &str) -> Query {
        Query::string(text)
    }

    fn search(
        &self,
        query: &String,
        limit: Option<usize>,
    ) -> Result<Vec<(Uid, RawRecord)>, AdapterError> {
        self.client.search(query, limit)
    }

    fn parse(&self, data: &RawRecord) -> Result<Submission, ParseError> {
        model::parse(data)
    }
}
