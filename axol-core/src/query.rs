use indexmap::IndexSet;
use std::hash::Hash;

/// A user-level query that compiles to zero or more provider-level search atoms.
///
/// `compile` is pure and finite; callers are expected to dedup across the queries of a
/// single feed via [`compile_queries`].
pub trait Compilable {
    type SearchQuery: Eq + Hash + Clone;

    fn compile(&self) -> Vec<Self::SearchQuery>;
}

/// Double-quotes `s`, the quoting convention shared by every provider's `string`/`exact`
/// query variant.
pub fn doublequote(s: &str) -> String {
    format!("\"{s}\"")
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QueryCheckError {
    #[error("query must not contain a single quote: {0:?}")]
    SingleQuote(String),
    #[error("query must not contain a double quote: {0:?}")]
    DoubleQuote(String),
}

/// Queries must not themselves carry quote characters, since quoting is applied by the
/// compiler.
pub fn check_query_text(s: &str) -> Result<(), QueryCheckError> {
    if s.contains('\'') {
        return Err(QueryCheckError::SingleQuote(s.to_string()));
    }
    if s.contains('"') {
        return Err(QueryCheckError::DoubleQuote(s.to_string()));
    }
    Ok(())
}

/// Compiles an ordered list of user queries into the deduped, first-seen-order sequence
/// of provider search atoms (port of `compile_queries` / `more_itertools.unique_everseen`).
pub fn compile_queries<Q: Compilable>(queries: &[Q]) -> Vec<Q::SearchQuery> {
    let mut seen: IndexSet<Q::SearchQuery> = IndexSet::new();
    for q in queries {
        for atom in q.compile() {
            seen.insert(atom);
        }
    }
    seen.into_iter().collect()
}
