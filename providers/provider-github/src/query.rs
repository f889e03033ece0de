use axol_core::{check_query_text, doublequote, Compilable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Code,
    Commit,
    Issue,
    Repository,
}

impl Kind {
    pub const ALL: [Kind; 4] = [Kind::Code, Kind::Commit, Kind::Issue, Kind::Repository];

    pub fn endpoint(&self) -> &'static str {
        match self {
            Kind::Code => "code",
            Kind::Commit => "commits",
            Kind::Issue => "issues",
            Kind::Repository => "repositories",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Text {
    Str(String),
    Exact(String),
    Raw(String),
}

/// A GitHub query carries `included`/`excluded` kind filters; they are mutually
/// exclusive. With neither set, every kind is searched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    text: Text,
    included: Option<Vec<Kind>>,
    excluded: Option<Vec<Kind>>,
}

#[derive(Debug, thiserror::Error)]
#[error("included and excluded kinds are mutually exclusive")]
pub struct KindFilterError;

impl Query {
    fn new(text: Text, included: Option<Vec<Kind>>, excluded: Option<Vec<Kind>>) -> Result<Self, KindFilterError> {
        if included.is_some() && excluded.is_some() {
            return Err(KindFilterError);
        }
        Ok(Query {
            text,
            included,
            excluded,
        })
    }

    pub fn string(q: impl Into<String>) -> Self {
        Query::new(Text::Str(q.into()), None, None).expect("no kind filters set")
    }

    pub fn exact(q: impl Into<String>) -> Self {
        Query::new(Text::Exact(q.into()), None, None).expect("no kind filters set")
    }

    pub fn raw(q: impl Into<String>) -> Self {
        Query::new(Text::Raw(q.into()), None, None).expect("no kind filters set")
    }

    pub fn with_included(mut self, kinds: Vec<Kind>) -> Result<Self, KindFilterError> {
        if self.excluded.is_some() {
            return Err(KindFilterError);
        }
        self.included = Some(kinds);
        Ok(self)
    }

    pub fn with_excluded(mut self, kinds: Vec<Kind>) -> Result<Self, KindFilterError> {
        if self.included.is_some() {
            return Err(KindFilterError);
        }
        self.excluded = Some(kinds);
        Ok(self)
    }

    fn kinds(&self) -> Vec<Kind> {
        match (&self.included, &self.excluded) {
            (Some(inc), None) => inc.clone(),
            (None, Some(exc)) => Kind::ALL.iter().copied().filter(|k| !exc.contains(k)).collect(),
            (None, None) => Kind::ALL.to_vec(),
            (Some(_), Some(_)) => unreachable!("constructors enforce mutual exclusion"),
        }
    }

    fn text_str(&self) -> String {
        match &self.text {
            Text::Str(q) | Text::Exact(q) => doublequote(q),
            Text::Raw(q) => q.clone(),
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
            .map(|kind| SearchQuery {
                kind,
                text: text.clone(),
            })
            .collect()
    }
}

pub fn check(text: &str) -> Result<(), axol_core::QueryCheckError> {
    check_query_text(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_fans_out_all_kinds() {
        let atoms = Query::string("rust").compile();
        assert_eq!(atoms.len(), 4);
    }

    #[test]
    fn included_limits_kinds() {
        let q = Query::string("rust").with_included(vec![Kind::Repository]).unwrap();
        assert_eq!(q.compile(), vec![SearchQuery { kind: Kind::Repository, text: "\"rust\"".into() }]);
    }

    #[test]
    fn included_and_excluded_are_mutually_exclusive() {
        let q = Query::string("rust").with_included(vec![Kind::Code]).unwrap();
        assert!(q.with_excluded(vec![Kind::Issue]).is_err());
    }
}
