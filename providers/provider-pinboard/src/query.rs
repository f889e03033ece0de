use axol_core::{check_query_text, doublequote, Compilable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Regular,
    Tag,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Text {
    Str(String),
    Exact(String),
    Raw(String),
}

/// Pinboard always searches the `regular` form; when the query text contains whitespace
/// (or is a raw query, which may contain anything) it additionally searches the `tag`
/// endpoint under three joined variants of the words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    text: Text,
}

impl Query {
    pub fn string(q: impl Into<String>) -> Self {
        Query { text: Text::Str(q.into()) }
    }

    pub fn exact(q: impl Into<String>) -> Self {
        Query { text: Text::Exact(q.into()) }
    }

    pub fn raw(q: impl Into<String>) -> Self {
        Query { text: Text::Raw(q.into()) }
    }

    fn raw_text(&self) -> &str {
        match &self.text {
            Text::Str(q) | Text::Exact(q) | Text::Raw(q) => q,
        }
    }

    fn regular_text(&self) -> String {
        match &self.text {
            Text::Str(q) | Text::Exact(q) => doublequote(q),
            Text::Raw(q) => q.clone(),
        }
    }

    /// A raw query always also searches tags; a quoted/plain query only does when it
    /// contains a literal space (single-word queries have no tag variants worth trying).
    fn wants_tag_fanout(&self) -> bool {
        match &self.text {
            Text::Raw(_) => true,
            Text::Exact(q) | Text::Str(q) => q.contains(' '),
        }
    }

    /// Tag-kind search text per variant: `raw`/`exact` are verbatim no-ops, `str` fans
    /// out across the three ways a multi-word query's spaces could form a tag, sorted
    /// and deduped (a single-word `str` just yields that one word back).
    fn tag_variants(&self) -> Vec<String> {
        match &self.text {
            Text::Raw(q) | Text::Exact(q) => vec![q.clone()],
            Text::Str(q) => {
                let mut variants: std::collections::BTreeSet<String> =
                    std::collections::BTreeSet::new();
                for repl in ["", "_", "-"] {
                    variants.insert(q.replace(' ', repl));
                }
                variants.into_iter().collect()
            }
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
        let mut out = vec![SearchQuery {
            kind: Kind::Regular,
            text: self.regular_text(),
        }];
        if self.wants_tag_fanout() {
            for variant in self.tag_variants() {
                out.push(SearchQuery {
                    kind: Kind::Tag,
                    text: variant,
                });
            }
        }
        out
    }
}

pub fn check(text: &str) -> Result<(), axol_core::QueryCheckError> {
    check_query_text(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_word_emits_only_regular() {
        let atoms = Query::exact("rust").compile();
        assert_eq!(atoms, vec![SearchQuery { kind: Kind::Regular, text: "\"rust\"".into() }]);
    }

    #[test]
    fn multi_word_str_fans_to_sorted_deduped_tag_variants() {
        let atoms = Query::string("greg egan").compile();
        assert_eq!(atoms[0], SearchQuery { kind: Kind::Regular, text: "\"greg egan\"".into() });
        let tag_texts: Vec<_> = atoms[1..].iter().map(|a| a.text.clone()).collect();
        assert_eq!(tag_texts, vec!["greg-egan", "greg_egan", "gregegan"]);
    }

    #[test]
    fn multi_word_exact_tag_is_verbatim_no_op() {
        let atoms = Query::exact("rust lang").compile();
        assert_eq!(
            atoms,
            vec![
                SearchQuery { kind: Kind::Regular, text: "\"rust lang\"".into() },
                SearchQuery { kind: Kind::Tag, text: "rust lang".into() },
            ]
        );
    }

    #[test]
    fn raw_query_always_fans_to_a_single_verbatim_tag() {
        let atoms = Query::raw("rust lang").compile();
        assert_eq!(
            atoms,
            vec![
                SearchQuery { kind: Kind::Regular, text: "rust lang".into() },
                SearchQuery { kind: Kind::Tag, text: "rust lang".into() },
            ]
        );
    }

    #[test]
    fn raw_single_word_still_fans_to_tag() {
        let atoms = Query::raw("single").compile();
        assert_eq!(
            atoms,
            vec![
                SearchQuery { kind: Kind::Regular, text: "single".into() },
                SearchQuery { kind: Kind::Tag, text: "single".into() },
            ]
        );
    }

    #[test]
    fn single_word_str_tag_collapses_to_one_variant() {
        let atoms = Query::string("greg_egan").compile();
        assert_eq!(atoms.len(), 1, "no space means no tag fan-out at all");
    }
}
