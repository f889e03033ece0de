use crate::model::Row;
use crate::query::{Kind, SearchQuery};
use axol_core::{AdapterError, RawRecord, Uid};
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::thread::sleep;
use std::time::Duration;

const SORT_ORDERS: [&str; 3] = ["newest", "relevance", "score"];
const MAX_PAGES: u32 = 20;
const SANITY_THRESHOLD: f64 = 0.70;
const PAGE_SLEEP: Duration = Duration::from_secs(2);
const THROTTLE_SLEEP: Duration = Duration::from_secs(5);

pub struct LobstersClient {
    http: reqwest::blocking::Client,
}

impl LobstersClient {
    pub fn new() -> Result<Self, AdapterError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent("axol/0.1")
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AdapterError::Transport(e.to_string()))?;
        Ok(LobstersClient { http })
    }

    fn fetch_page(&self, what: &str, order: &str, q: &str, page: u32) -> Result<String, AdapterError> {
        loop {
            let resp = self
                .http
                .get("https://lobste.rs/search")
                .query(&[
                    ("q", q),
                    ("what", what),
                    ("order", order),
                    ("page", &page.to_string()),
                ])
                .send()
                .map_err(|e| AdapterError::Transport(e.to_string()))?;
            if !resp.status().is_success() {
                return Err(AdapterError::Transport(format!(
                    "lobsters search returned status {}",
                    resp.status()
                )));
            }
            let body = resp
                .text()
                .map_err(|e| AdapterError::Transport(e.to_string()))?;
            if body.contains("Throttled, sleep") {
                sleep(THROTTLE_SLEEP);
                continue;
            }
            return Ok(body);
        }
    }

    pub fn search(
        &self,
        query: &SearchQuery,
        limit: Option<usize>,
    ) -> Result<Vec<(Uid, RawRecord)>, AdapterError> {
        crate::query::validate_search_query(&query.text).map_err(AdapterError::InvalidQuery)?;

        let row_selector = Selector::parse(".story, .comment").unwrap();
        let title_selector = Selector::parse(".link a, .u-url").unwrap();
        let byline_selector = Selector::parse(".byline").unwrap();
        let dt_selector = Selector::parse(".byline span[title]").unwrap();
        let total_selector = Selector::parse(".pagination_summary, .page_summary").unwrap();

        let mut out = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut prior_total: Option<u64> = None;

        for order in SORT_ORDERS {
            let mut page = 1u32;
            let mut reported_total: Option<u64> = None;
            loop {
                let html = self.fetch_page(query.kind.what_param(), order, &query.text, page)?;
                let doc = Html::parse_document(&html);

                if reported_total.is_none() {
                    reported_total = doc
                        .select(&total_selector)
                        .next()
                        .and_then(|el| {
                            el.text()
                                .collect::<String>()
                                .chars()
                                .filter(|c| c.is_ascii_digit())
                                .collect::<String>()
                                .parse::<u64>()
                                .ok()
                        });
                    if let Some(total) = reported_total {
                        if let Some(prior) = prior_total {
                            if total == prior {
                                break;
                            }
                        }
                        prior_total = Some(total);
                    }
                }

                let rows: Vec<_> = doc.select(&row_selector).collect();
                if rows.is_empty() {
                    break;
                }

                for row in &rows {
                    let text = row.text().collect::<String>();
                    if text.contains("Story removed by submitter") {
                        continue;
                    }
                    let Some(link) = row.select(&title_selector).next() else { continue };
                    let Some(permalink_rel) = link.value().attr("href") else { continue };
                    let Some(id) = permalink_rel.rsplit('/').find(|s| !s.is_empty()).map(str::to_string) else {
                        continue;
                    };
                    if !seen.insert(id.clone()) {
                        continue;
                    }
                    // The byline carries one or more `span[title]` elements; the one
                    // whose rendered text reads "... ago" holds the real creation time
                    // in its `title` attribute (everything else is relative/decoration).
                    let Some(dt) = row
                        .select(&dt_selector)
                        .find(|el| el.text().collect::<String>().contains("ago"))
                        .and_then(|el| el.value().attr("title"))
                        .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
                        .map(|dt| dt.with_timezone(&chrono::Utc))
                    else {
                        continue;
                    };
                    let title = link.text().collect::<String>().trim().to_string();
                    let url = link.value().attr("href").unwrap_or_default().to_string();
                    let author = row
                        .select(&byline_selector)
                        .next()
                        .map(|el| el.text().collect::<String>().trim().to_string())
                        .unwrap_or_default();

                    let model_row = Row {
                        kind: if matches!(query.kind, Kind::Comment) { "comment" } else { "story" }.into(),
                        dt,
                        id: id.clone(),
                        title,
                        url,
                        author,
                        permalink: format!("https://lobste.rs{permalink_rel}"),
                    };
                    let uid = Uid::new(format!("{}_{}", query.kind.what_param(), id))
                        .map_err(|e| AdapterError::Transport(format!("bad lobsters uid: {e}")))?;
                    let record = RawRecord::from_json(&model_row)
                        .map_err(|e| AdapterError::Transport(e.to_string()))?;
                    out.push((uid, record));

                    if let Some(n) = limit {
                        if out.len() >= n {
                            return Ok(out);
                        }
                    }
                }

                if page >= MAX_PAGES {
                    break;
                }
                page += 1;
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
        }

        Ok(out)
    }
}
