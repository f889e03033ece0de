use crate::query::{Kind, SearchQuery};
use axol_core::{AdapterError, RawRecord, Uid};
use scraper::{Html, Selector};
use serde::Deserialize;
use std::collections::HashSet;
use std::thread::sleep;
use std::time::Duration;

const PAGE_STEP: u32 = 20;
const SANITY_THRESHOLD: f64 = 0.90;
const PAGE_SLEEP: Duration = Duration::from_secs(5);

/// The embedded JSON blob Pinboard's search page ships alongside the rendered HTML list.
#[derive(Debug, Deserialize)]
struct EmbeddedPage {
    total: u64,
    items: Vec<EmbeddedBookmark>,
}

#[derive(Debug, Deserialize)]
struct EmbeddedBookmark {
    slug: String,
    created_at: chrono::DateTime<chrono::Utc>,
    author: String,
    title: String,
    url: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    description: Option<String>,
}

pub struct PinboardClient {
    http: reqwest::blocking::Client,
}

impl PinboardClient {
    pub fn new() -> Result<Self, AdapterError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent("axol/0.1")
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AdapterError::Transport(e.to_string()))?;
        Ok(PinboardClient { http })
    }

    fn fetch_page(&self, query: &SearchQuery, start: u32) -> Result<EmbeddedPage, AdapterError> {
        let url = match query.kind {
            Kind::Regular => "https://pinboard.in/search/".to_string(),
            Kind::Tag => format!("https://pinboard.in/t:{}", query.text),
        };
        let mut qs = vec![("start", start.to_string())];
        if matches!(query.kind, Kind::Regular) {
            qs.push(("query", query.text.clone()));
        }

        let resp = self
            .http
            .get(&url)
            .query(&qs)
            .send()
            .map_err(|e| AdapterError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(AdapterError::Transport(format!(
                "pinboard search returned status {}",
                resp.status()
            )));
        }
        let body = resp.text().map_err(|e| AdapterError::Transport(e.to_string()))?;

        let doc = Html::parse_document(&body);
        let selector = Selector::parse("script#bmarks-data").unwrap();
        let Some(script) = doc.select(&selector).next() else {
            return Ok(EmbeddedPage { total: 0, items: Vec::new() });
        };
        let json = script.text().collect::<String>();
        serde_json::from_str(&json)
            .map_err(|e| AdapterError::Transport(format!("invalid embedded pinboard json: {e}")))
    }

    pub fn search(
        &self,
        query: &SearchQuery,
        limit: Option<usize>,
    ) -> Result<Vec<(Uid, RawRecord)>, AdapterError> {
        let mut out = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut start = 0u32;
        let mut reported_total: Option<u64> = None;

        loop {
            let page = self.fetch_page(query, start)?;
            if reported_total.is_none() {
                reported_total = Some(page.total);
            }
            if page.items.is_empty() {
                break;
            }

            for item in page.items {
                if !seen.insert(item.slug.clone()) {
                    continue;
                }
                let uid = Uid::new(item.slug.clone())
                    .map_err(|e| AdapterError::Transport(format!("bad pinboard uid: {e}")))?;
                let bookmark = crate::model::Bookmark {
                    slug: item.slug,
                    created_at: item.created_at,
                    author: item.author,
                    title: item.title,
                    url: item.url,
                    tags: item.tags,
                    description: item.description,
                };
                let record = RawRecord::from_json(&bookmark)
                    .map_err(|e| AdapterError::Transport(e.to_string()))?;
                out.push((uid, record));

                if let Some(n) = limit {
                    if out.len() >= n {
                        return Ok(out);
                    }
                }
            }

            start += PAGE_STEP;
            sleep(PAGE_SLEEP);
        }

        if limit.is_none() {
            if let Some(total) = reported_total {
                if total > 10 && (seen.len() as f64) < (total as f64) * SANITY_THRESHOLD {
                    return Err(AdapterError::Sanity {
                        got: seen.len(),
                        reported: total as usize,
                        threshold: SANITY_THRESHOLD,
                    });
                }
            }
        }

        Ok(out)
    }
}
