use axol_core::{doublequote, Compilable};

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

/// Reddit's search endpoint is queried once per sort order (`search.rs::SORT_ORDERS`);
/// the compiled atom is just the text, quoting included.
impl Compilable for Query {
    type SearchQuery = String;

    fn compile(&self) -> Vec<String> {
        match self {
            Query::Str(q) | Query::Exact(q) => vec![doublequote(q)],
            Query::Raw(q) => vec![q.clone()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting() {
        assert_eq!(Query::string("foo").compile(), vec!["\"foo\""]);
        assert_eq!(Query::raw("foo bar").compile(), vec!["foo bar"]);
    }
}
