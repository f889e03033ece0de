use axol_core::{check_query_text, doublequote, Compilable};

/// User-level Hacker News query. `String`/`Exact` both compile to a double-quoted
/// phrase (Algolia's default ranking otherwise surfaces too many loose matches); `Raw`
/// passes the text through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Str(String),
    Exact(String),
    Raw(String),
}

impl Query {
    pub fn string(q: impl Into<String>) -> Self {
        Query::Str(q.into())
    }

    pub fn exact(q: impl Into<String>) -> Self {
        Query::Exact(q.into())
    }

    pub fn raw(q: impl Into<String>) -> Self {
        Query::Raw(q.into())
    }
}

impl Compilable for Query {
    type SearchQuery = String;

    fn compile(&self) -> Vec<String> {
        match self {
            Query::Str(q) | Query::Exact(q) => vec![doublequote(q)],
            Query::Raw(q) => vec![q.clone()],
        }
    }
}

/// Algolia's `search_by_date` rejects a bare `'` in the query string; reject it up
/// front as a validation error instead of letting the request fail server-side.
pub fn validate_search_query(q: &str) -> Result<(), axol_core::AdapterError> {
    if q.contains('\'') {
        return Err(axol_core::AdapterError::InvalidQuery(format!(
            "hackernews search query must not contain a single quote: {q:?}"
        )));
    }
    Ok(())
}

/// Non-quoted text (the part the user actually typed) must itself be free of quote
/// characters, since quoting is applied by `compile`.
pub fn check(text: &str) -> Result<(), axol_core::QueryCheckError> {
    check_query_text(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_and_exact_are_quoted() {
        assert_eq!(Query::string("rust").compile(), vec!["\"rust\""]);
        assert_eq!(Query::exact("rust").compile(), vec!["\"rust\""]);
    }

    #[test]
    fn raw_is_untouched() {
        assert_eq!(Query::raw("rust lang").compile(), vec!["rust lang"]);
    }

    #[test]
    fn rejects_single_quote_in_search() {
        assert!(validate_search_query("o'brien").is_err());
        assert!(validate_search_query("rust").is_ok());
    }
}
