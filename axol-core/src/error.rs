use thiserror::Error;

/// Raised by a provider adapter while fetching search results.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("query rejected by provider: {0}")]
    InvalidQuery(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("sanity check failed: got {got} of reported {reported} (threshold {threshold:.0}%)")]
    Sanity {
        got: usize,
        reported: usize,
        threshold: f64,
    },
    #[error("provider returned duplicate uid {0:?} within a single sort/pagination pass")]
    DuplicateUid(String),
}

/// Raised by a provider adapter's `parse`. Carries enough context to attribute the
/// failure to a single stored row without aborting the surrounding stream.
#[derive(Debug, Error, Clone)]
#[error("failed to parse record: {message}")]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        ParseError {
            message: message.into(),
        }
    }
}

/// Orchestration-level error, wrapping adapter/storage failures attributable to a whole
/// feed rather than a single item.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Adapter(#[from] AdapterError),
    #[error(transparent)]
    Storage(#[from] axol_storage::StoreError),
    #[error("feed configuration error: {0}")]
    Configuration(String),
}

/// A parse failure surfaced as a stream value rather than a panic, matching the
/// "exceptions as control flow" -> "result-in-stream" redesign.
#[derive(Debug, Clone)]
pub struct ParseErrorInfo {
    pub message: String,
    pub raw_preview: String,
}

impl From<ParseError> for ParseErrorInfo {
    fn from(e: ParseError) -> Self {
        ParseErrorInfo {
            message: e.message,
            raw_preview: String::new(),
        }
    }
}
