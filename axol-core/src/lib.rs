//! Provider-polymorphic query compiler and feed orchestrator shared by every axol
//! provider adapter.

pub mod error;
pub mod feed;
pub mod query;

pub use error::{AdapterError, FeedError, ParseError, ParseErrorInfo};
pub use feed::{AnyFeed, CrawlRow, Exclude, Feed, FeedNameError, ProviderAdapter};
pub use query::{check_query_text, compile_queries, doublequote, Compilable, QueryCheckError};

// Re-exported so downstream crates only need to depend on `axol-core`.
pub use axol_storage::{CrawlDt, CrawlTimestamp, OpenMode, RawRecord, Store, StoreError, Uid, UidError};
