use axol_core::{check_query_text, doublequote, Compilable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Story,
    Comment,
}

impl Kind {
    pub const ALL: [Kind; 2] = [Kind::Story, Kind::Comment];

    pub fn what_param(&self) -> &'static str {
        match self {
            Kind::Story => "stories",
            Kind::Comment => "comments",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Text {
    Str(String),
    Exact(String),
    Raw(String),
}

/// Search is exact-only at the service; `kind` pins the fan-out to one of
/// `{stories, comments}`, otherwise both are searched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    text: Text,
    kind: Option<Kind>,
}

impl Query {
    pub fn string(q: impl Into<String>) -> Self {
        Query { text: Text::Str(q.into()), kind: None }
    }

    pub fn exact(q: impl Into<String>) -> Self {
        Query { text: Text::Exact(q.into()), kind: None }
    }

    pub fn raw(q: impl Into<String>) -> Self {
        Query { text: Text::Raw(q.into()), kind: None }
    }

    pub fn with_kind(mut self, kind: Kind) -> Self {
        self.kind = Some(kind);
        self
    }

    fn text_str(&self) -> String {
        match &self.text {
            Text::Str(q) | Text::Exact(q) => doublequote(q),
            Text::Raw(q) => q.clone(),
        }
    }

    fn kinds(&self) -> Vec<Kind> {
        match self.kind {
            Some(k) => vec![k],
            None => Kind::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchQuery {
    pub kind: Kind,
    pub text: String,
}

impl Compilable for Query {
    type SearchQuery = SearchQuery;

    fn compile(&self) -> Vec<SearchQuery> {
        let text = self.text_str();
        self.kinds()
            .into_iter()
            .map(|kind| SearchQuery { kind, text: text.clone() })
            .collect()
    }
}

pub fn check(text: &str) -> Result<(), axol_core::QueryCheckError> {
    check_query_text(text)
}

/// Lobsters search chokes on a bare `/`; reject it before any network call.
pub fn validate_search_query(text: &str) -> Result<(), String> {
    if text.contains('/') {
        return Err(format!("lobsters search query must not contain '/': {text:?}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_fans_out_both_kinds() {
        let atoms = Query::string("rust").compile();
        assert_eq!(atoms.len(), 2);
    }

    #[test]
    fn pinned_kind_yields_one_atom() {
        let atoms = Query::string("rust").with_kind(Kind::Comment).compile();
        assert_eq!(atoms, vec![SearchQuery { kind: Kind::Comment, text: "\"rust\"".into() }]);
    }

    #[test]
    fn rejects_slash() {
        assert!(validate_search_query("a/b").is_err());
    }
}
