use crate::error::{AdapterError, FeedError, ParseError, ParseErrorInfo};
use crate::query::{compile_queries, Compilable};
use axol_storage::{CrawlDt, RawRecord, Store, Uid};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{info_span, warn};

/// Contract every content source adapter satisfies. `PREFIX` forms the leading half of a
/// feed name; `Query`/`SearchQuery` are provider-specific, `Entity` is the provider's
/// parsed sum type.
pub trait ProviderAdapter: Send + Sync + 'static {
    const PREFIX: &'static str;
    type Query: Compilable<SearchQuery = Self::SearchQuery> + Clone;
    type SearchQuery: Eq + std::hash::Hash + Clone + fmt::Debug;
    type Entity;

    fn default_query(&self, text: &str) -> Self::Query;

    /// Newest-first (or provider-preferred) results for one compiled query, bounded by
    /// `limit` across the whole sequence. Must internally dedup by uid.
    fn search(
        &self,
        query: &Self::SearchQuery,
        limit: Option<usize>,
    ) -> Result<Vec<(Uid, RawRecord)>, AdapterError>;

    /// Pure parse from persisted bytes to the provider's entity type.
    fn parse(&self, data: &RawRecord) -> Result<Self::Entity, ParseError>;
}

/// A feed's exclusion rule: either over the raw bytes directly, or over the parsed
/// entity (lifted to a raw-bytes predicate via `parse`). At most one is ever set; the
/// two-variant enum makes that structural rather than an assert.
pub enum Exclude<E> {
    Parsed(Box<dyn Fn(&E) -> bool + Send + Sync>),
    Raw(Box<dyn Fn(&[u8]) -> bool + Send + Sync>),
}

static QUERY_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9._]+$").unwrap());

#[derive(Debug, thiserror::Error)]
pub enum FeedNameError {
    #[error("query name {0:?} must match [A-Za-z0-9._]+")]
    InvalidQueryName(String),
}

/// Shared implementation behind `Feed::is_excluded` and the owned closure `prune_db`
/// hands to `Store::delete` (which must be `'static` and so cannot borrow `&Feed`).
fn is_excluded_with<A: ProviderAdapter>(
    exclude: &Option<Arc<Exclude<A::Entity>>>,
    adapter: &A,
    feed_name: &str,
    data: &RawRecord,
) -> bool {
    match exclude {
        None => false,
        Some(exclude) => match exclude.as_ref() {
            Exclude::Raw(f) => match catch_unwind(AssertUnwindSafe(|| f(data.as_bytes()))) {
                Ok(b) => b,
                Err(_) => {
                    warn!(feed = feed_name, "exclude predicate panicked; keeping item");
                    false
                }
            },
            Exclude::Parsed(f) => match adapter.parse(data) {
                Ok(entity) => match catch_unwind(AssertUnwindSafe(|| f(&entity))) {
                    Ok(b) => b,
                    Err(_) => {
                        warn!(feed = feed_name, "exclude predicate panicked; keeping item");
                        false
                    }
                },
                Err(e) => {
                    warn!(feed = feed_name, error = %e, "exclude predicate could not parse item; keeping it");
                    false
                }
            },
        },
    }
}

fn preview(data: &RawRecord) -> String {
    let s = data.as_str().unwrap_or("<binary>");
    let truncated: String = s.chars().take(120).collect();
    truncated
}

/// Binds a provider adapter, a set of user queries, a store, and an optional excluder
/// into the crawl/feed/prune pipelines. Generic over the adapter so each concrete
/// provider gets a statically-dispatched `Feed<ProviderXAdapter>` rather than going
/// through a runtime trait-object registry.
pub struct Feed<A: ProviderAdapter> {
    pub name: String,
    pub queries: Vec<A::Query>,
    pub store: Store,
    pub adapter: Arc<A>,
    exclude: Option<Arc<Exclude<A::Entity>>>,
}

impl<A: ProviderAdapter> Feed<A> {
    pub fn new(
        query_name: &str,
        adapter: A,
        queries: Vec<A::Query>,
        store: Store,
        exclude: Option<Exclude<A::Entity>>,
    ) -> Result<Self, FeedNameError> {
        if !QUERY_NAME_RE.is_match(query_name) {
            return Err(FeedNameError::InvalidQueryName(query_name.to_string()));
        }
        Ok(Feed {
            name: format!("{}_{}", A::PREFIX, query_name),
            queries,
            store,
            adapter: Arc::new(adapter),
            exclude: exclude.map(Arc::new),
        })
    }

    /// Defensive, fail-open exclusion check: any panic or parse failure inside the
    /// predicate is logged and treated as "not excluded".
    fn is_excluded(&self, data: &RawRecord) -> bool {
        is_excluded_with(&self.exclude, &self.adapter, &self.name, data)
    }

    /// Runs every compiled query against the adapter, deduping uids across queries and
    /// dropping excluded items. Per-query adapter errors are logged and that query's
    /// contribution is simply empty; they do not abort the other queries.
    pub fn search_all(&self, limit: Option<usize>) -> Result<Vec<(Uid, RawRecord)>, FeedError> {
        let span = info_span!("feed", feed = %self.name);
        let _enter = span.enter();

        let atoms = compile_queries(&self.queries);
        let mut handled: HashSet<Uid> = HashSet::new();
        let mut out = Vec::new();
        for atom in &atoms {
            match self.adapter.search(atom, limit) {
                Ok(results) => {
                    for (uid, data) in results {
                        if handled.contains(&uid) {
                            continue;
                        }
                        handled.insert(uid.clone());
                        if self.is_excluded(&data) {
                            continue;
                        }
                        out.push((uid, data));
                    }
                }
                Err(e) => {
                    warn!(feed = %self.name, query = ?atom, error = %e, "search pass failed");
                }
            }
        }
        Ok(out)
    }

    /// Forces `search_all`, sorts by uid, inserts into the store, and parses every
    /// newly-inserted row. Parse failures are surfaced as `Err` values, not panics.
    pub fn crawl(
        &self,
        limit: Option<usize>,
        dry: bool,
    ) -> Vec<(CrawlDt, Uid, Result<A::Entity, ParseErrorInfo>)> {
        let span = info_span!("feed", feed = %self.name);
        let _enter = span.enter();

        let mut items = match self.search_all(limit) {
            Ok(v) => v,
            Err(e) => {
                warn!(feed = %self.name, error = %e, "search_all failed during crawl");
                Vec::new()
            }
        };
        items.sort_by(|a, b| a.0.cmp(&b.0));

        let inserted = match self.store.insert(items, dry) {
            Ok(v) => v,
            Err(e) => {
                warn!(feed = %self.name, error = %e, "insert failed during crawl");
                return Vec::new();
            }
        };

        inserted
            .into_iter()
            .map(|(ts, uid, data)| {
                let dt = ts.to_datetime();
                match self.adapter.parse(&data) {
                    Ok(entity) => (dt, uid, Ok(entity)),
                    Err(e) => {
                        warn!(feed = %self.name, uid = %uid, error = %e, "parse failed");
                        let info = ParseErrorInfo {
                            message: e.message,
                            raw_preview: preview(&data),
                        };
                        (dt, uid, Err(info))
                    }
                }
            })
            .collect()
    }

    /// Streams everything currently stored, applying the excluder and parsing on read.
    pub fn feed(&self) -> Vec<(CrawlDt, Uid, Result<A::Entity, ParseErrorInfo>)> {
        let span = info_span!("feed", feed = %self.name);
        let _enter = span.enter();

        let rows = match self.store.select_all() {
            Ok(v) => v,
            Err(e) => {
                warn!(feed = %self.name, error = %e, "select_all failed");
                return Vec::new();
            }
        };

        let mut excluded_count = 0usize;
        let mut out = Vec::with_capacity(rows.len());
        for (ts, uid, data) in rows {
            if self.is_excluded(&data) {
                excluded_count += 1;
                continue;
            }
            let dt = ts.to_datetime();
            match self.adapter.parse(&data) {
                Ok(entity) => out.push((dt, uid, Ok(entity))),
                Err(e) => {
                    let info = ParseErrorInfo {
                        message: e.message,
                        raw_preview: preview(&data),
                    };
                    out.push((dt, uid, Err(info)));
                }
            }
        }
        if excluded_count > 0 {
            warn!(feed = %self.name, excluded_count, "items excluded at read time; consider running prune");
        }
        out
    }

    /// The compiled, deduped `SearchQuery` fan-out this feed's queries produce, each
    /// rendered via `Debug` for the dyn-compatible boundary (`feeds --search`).
    pub fn compiled_queries(&self) -> Vec<String> {
        compile_queries(&self.queries)
            .into_iter()
            .map(|atom| format!("{atom:?}"))
            .collect()
    }

    /// Applies the current excluder destructively against the store. A feed with no
    /// excluder has nothing to prune.
    pub fn prune_db(&self, dry: bool) -> Vec<(CrawlDt, Uid, Result<A::Entity, ParseErrorInfo>)> {
        let span = info_span!("feed", feed = %self.name);
        let _enter = span.enter();

        if self.exclude.is_none() {
            tracing::info!(feed = %self.name, "no exclude predicate set; nothing to prune");
            return Vec::new();
        }

        let exclude = self.exclude.clone();
        let adapter = Arc::clone(&self.adapter);
        let feed_name = self.name.clone();
        let rows = match self.store.delete(dry, move |bytes| {
            is_excluded_with(&exclude, &adapter, &feed_name, &RawRecord::new(bytes.to_vec()))
        }) {
            Ok(v) => v,
            Err(e) => {
                warn!(feed = %self.name, error = %e, "delete failed during prune");
                return Vec::new();
            }
        };

        rows.into_iter()
            .map(|(ts, uid, data)| {
                let dt = ts.to_datetime();
                match self.adapter.parse(&data) {
                    Ok(entity) => (dt, uid, Ok(entity)),
                    Err(e) => {
                        let info = ParseErrorInfo {
                            message: e.message,
                            raw_preview: preview(&data),
                        };
                        (dt, uid, Err(info))
                    }
                }
            })
            .collect()
    }
}

/// One row of crawl/feed/prune output with the entity type-erased to its `Debug`
/// rendering, for the dyn-compatible [`AnyFeed`] boundary used by the feed registry and
/// CLI, which must hold feeds of differing `Entity`/`Query` types in one collection.
pub struct CrawlRow {
    pub crawled_at: CrawlDt,
    pub uid: Uid,
    pub entity: Result<String, ParseErrorInfo>,
}

/// Dyn-compatible façade over `Feed<A>`, letting the feed registry and CLI hold
/// `Vec<Box<dyn AnyFeed>>` across heterogeneous provider adapters.
pub trait AnyFeed: Send + Sync {
    fn name(&self) -> &str;
    fn search_all(&self, limit: Option<usize>) -> Result<Vec<(Uid, RawRecord)>, FeedError>;
    fn crawl(&self, limit: Option<usize>, dry: bool) -> Vec<CrawlRow>;
    fn feed(&self) -> Vec<CrawlRow>;
    fn prune_db(&self, dry: bool) -> Vec<CrawlRow>;
    fn compiled_queries(&self) -> Vec<String>;
}

impl<A: ProviderAdapter> AnyFeed for Feed<A>
where
    A::Entity: fmt::Debug,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn search_all(&self, limit: Option<usize>) -> Result<Vec<(Uid, RawRecord)>, FeedError> {
        Feed::search_all(self, limit)
    }

    fn crawl(&self, limit: Option<usize>, dry: bool) -> Vec<CrawlRow> {
        Feed::crawl(self, limit, dry)
            .into_iter()
            .map(|(crawled_at, uid, entity)| CrawlRow {
                crawled_at,
                uid,
                entity: entity.map(|e| format!("{e:?}")),
            })
            .collect()
    }

    fn feed(&self) -> Vec<CrawlRow> {
        Feed::feed(self)
            .into_iter()
            .map(|(crawled_at, uid, entity)| CrawlRow {
                crawled_at,
                uid,
                entity: entity.map(|e| format!("{e:?}")),
            })
            .collect()
    }

    fn prune_db(&self, dry: bool) -> Vec<CrawlRow> {
        Feed::prune_db(self, dry)
            .into_iter()
            .map(|(crawled_at, uid, entity)| CrawlRow {
                crawled_at,
                uid,
                entity: entity.map(|e| format!("{e:?}")),
            })
            .collect()
    }

    fn compiled_queries(&self) -> Vec<String> {
        Feed::compiled_queries(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Compilable;
    use axol_storage::OpenMode;
    use tempfile::tempdir;

    #[derive(Clone, PartialEq, Eq, Hash, Debug)]
    struct MockQuery(String);

    impl Compilable for MockQuery {
        type SearchQuery = String;
        fn compile(&self) -> Vec<String> {
            vec![self.0.clone()]
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct MockEntity {
        uid: String,
        text: String,
    }

    /// Test double standing in for a real provider's HTTP/scrape client: pages are
    /// supplied up front, and `search` replays them, optionally failing partway through
    /// (scenario 6, "Atomic insert under failure").
    struct MockAdapter {
        pages: Vec<(Uid, RawRecord)>,
        fail_after: Option<usize>,
        fail_parse_for: Vec<Uid>,
    }

    impl ProviderAdapter for MockAdapter {
        const PREFIX: &'static str = "mock";
        type Query = MockQuery;
        type SearchQuery = String;
        type Entity = MockEntity;

        fn default_query(&self, text: &str) -> MockQuery {
            MockQuery(text.to_string())
        }

        fn search(
            &self,
            _query: &String,
            _limit: Option<usize>,
        ) -> Result<Vec<(Uid, RawRecord)>, AdapterError> {
            let all = self.pages.clone();
            if let Some(n) = self.fail_after {
                if all.len() > n {
                    return Err(AdapterError::Transport("simulated failure".into()));
                }
            }
            Ok(all)
        }

        fn parse(&self, data: &RawRecord) -> Result<MockEntity, ParseError> {
            let text = data.as_str().unwrap_or_default().to_string();
            let uid: String = text.split(':').next().unwrap_or_default().to_string();
            if self.fail_parse_for.iter().any(|u| u.as_str() == uid) {
                return Err(ParseError::new(format!("cannot parse {uid}")));
            }
            Ok(MockEntity { uid, text })
        }
    }

    fn row(uid: &str) -> (Uid, RawRecord) {
        let uid_v = Uid::new(uid).unwrap();
        let data = RawRecord::from(format!("{uid}:item {uid}"));
        (uid_v, data)
    }

    #[test]
    fn crawl_then_feed_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = Store::open(&dir.path().join("f.sqlite"), OpenMode::Writable).unwrap();
        let pages: Vec<_> = (0..100).map(|i| row(&format!("{i:03}"))).collect();
        let adapter = MockAdapter {
            pages,
            fail_after: None,
            fail_parse_for: vec![],
        };
        let feed = Feed::new(
            "test",
            adapter,
            vec![MockQuery("q".into())],
            store,
            None,
        )
        .unwrap();

        let first = feed.crawl(None, false);
        assert_eq!(first.len(), 100);

        let second = feed.crawl(None, false);
        assert_eq!(second.len(), 0, "re-crawl should yield no new rows");

        let fed = feed.feed();
        assert_eq!(fed.len(), 100);
    }

    #[test]
    fn prune_dry_vs_real() {
        let dir = tempdir().unwrap();
        let store = Store::open(&dir.path().join("f.sqlite"), OpenMode::Writable).unwrap();
        let pages: Vec<_> = (0..100).map(|i| row(&format!("{i:03}"))).collect();
        let adapter = MockAdapter {
            pages,
            fail_after: None,
            fail_parse_for: vec![],
        };
        let exclude: Exclude<MockEntity> =
            Exclude::Raw(Box::new(|data: &[u8]| {
                std::str::from_utf8(data).unwrap_or("").contains("00")
            }));
        let feed = Feed::new(
            "test",
            adapter,
            vec![MockQuery("q".into())],
            store,
            Some(exclude),
        )
        .unwrap();
        feed.crawl(None, false);

        let dry = feed.prune_db(true);
        assert_eq!(dry.len(), 10);
        assert_eq!(feed.store.select_all().unwrap().len(), 100);

        let real = feed.prune_db(false);
        assert_eq!(real.len(), 10);
        assert_eq!(feed.store.select_all().unwrap().len(), 90);
    }

    #[test]
    fn late_exclude_update_does_not_touch_storage() {
        let dir = tempdir().unwrap();
        let store = Store::open(&dir.path().join("f.sqlite"), OpenMode::Writable).unwrap();
        let pages: Vec<_> = (0..100).map(|i| row(&format!("{i:03}"))).collect();
        let adapter = MockAdapter {
            pages,
            fail_after: None,
            fail_parse_for: vec![],
        };
        let feed = Feed::new("test", adapter, vec![MockQuery("q".into())], store, None).unwrap();
        feed.crawl(None, false);
        assert_eq!(feed.feed().len(), 100);

        let exclude: Exclude<MockEntity> =
            Exclude::Parsed(Box::new(|e: &MockEntity| e.text.contains('9')));
        let feed2 = Feed {
            exclude: Some(Arc::new(exclude)),
            ..feed
        };
        assert_eq!(feed2.feed().len(), 81);
        assert_eq!(feed2.store.select_all().unwrap().len(), 100);
    }

    #[test]
    fn exclude_error_tolerance_keeps_item() {
        let dir = tempdir().unwrap();
        let store = Store::open(&dir.path().join("f.sqlite"), OpenMode::Writable).unwrap();
        let pages: Vec<_> = (0..100).map(|i| row(&format!("{i:03}"))).collect();
        let adapter = MockAdapter {
            pages,
            fail_after: None,
            fail_parse_for: vec![Uid::new("011").unwrap()],
        };
        let exclude: Exclude<MockEntity> =
            Exclude::Parsed(Box::new(|e: &MockEntity| e.text.contains("00")));
        let feed = Feed::new(
            "test",
            adapter,
            vec![MockQuery("q".into())],
            store,
            Some(exclude),
        )
        .unwrap();
        feed.crawl(None, false);

        let pruned = feed.prune_db(false);
        // "00" matches uids 000..009 and 100 doesn't exist, so 10 matches minus the
        // parse-failing uid 011 is unaffected (011 doesn't contain "00" anyway); the
        // fail-open path is exercised via feed() below.
        assert_eq!(pruned.len(), 10);

        let remaining = feed.store.select_all().unwrap();
        assert!(remaining.iter().any(|(_, uid, _)| uid.as_str() == "011"));
    }

    #[test]
    fn parse_error_isolation() {
        let dir = tempdir().unwrap();
        let store = Store::open(&dir.path().join("f.sqlite"), OpenMode::Writable).unwrap();
        let pages: Vec<_> = (1..=99).map(|i| row(&i.to_string())).collect();
        let fail_for: Vec<Uid> = (1..=99)
            .filter(|i| i % 10 == 9)
            .map(|i| Uid::new(i.to_string()).unwrap())
            .collect();
        let adapter = MockAdapter {
            pages,
            fail_after: None,
            fail_parse_for: fail_for,
        };
        let feed = Feed::new("test", adapter, vec![MockQuery("q".into())], store, None).unwrap();
        let rows = feed.crawl(None, false);
        assert_eq!(rows.len(), 99);
        let errs = rows.iter().filter(|(_, _, e)| e.is_err()).count();
        assert_eq!(errs, 10);
        assert_eq!(feed.store.select_all().unwrap().len(), 99);
    }

    /// A provider that errors partway through a crawl must never leave the store
    /// partially written: `search_all` isolates the failing query to an empty
    /// contribution (logged, not raised), so `crawl` either inserts everything a
    /// pass produced or nothing from the failing pass at all. The real guarantee that
    /// `Store::insert` itself commits its whole batch or none of it — including when the
    /// *input* batch fails mid-transaction — is exercised directly against
    /// `axol-storage` in its own crate-level atomicity test.
    #[test]
    fn failing_provider_pass_leaves_prior_rows_untouched() {
        let dir = tempdir().unwrap();
        let store = Store::open(&dir.path().join("f.sqlite"), OpenMode::Writable).unwrap();
        let first_pages: Vec<_> = (0..10).map(|i| row(&format!("a{i}"))).collect();
        let adapter = MockAdapter {
            pages: first_pages.clone(),
            fail_after: None,
            fail_parse_for: vec![],
        };
        let feed = Feed::new("test", adapter, vec![MockQuery("q".into())], store, None).unwrap();
        feed.crawl(None, false);
        assert_eq!(feed.store.select_all().unwrap().len(), 10);

        // Swap in an adapter that errors on every search call (simulating the provider
        // failing partway through the next page) and crawl again through the same store.
        let failing_adapter = MockAdapter {
            pages: {
                let mut pages = first_pages;
                pages.push((Uid::new("boom").unwrap(), RawRecord::from("boom:x")));
                pages
            },
            fail_after: Some(0),
            fail_parse_for: vec![],
        };
        let feed = Feed {
            adapter: Arc::new(failing_adapter),
            ..feed
        };
        let rows = feed.crawl(None, false);
        assert!(rows.is_empty(), "a failing search pass must contribute nothing");
        assert_eq!(feed.store.select_all().unwrap().len(), 10, "prior rows must be untouched");
    }
}
