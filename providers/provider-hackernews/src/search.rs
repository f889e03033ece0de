use crate::query::validate_search_query;
use axol_core::{AdapterError, RawRecord, Uid};
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;

const ALGOLIA_ENDPOINT: &str = "https://hn.algolia.com/api/v1/search_by_date";
const HITS_PER_PAGE: usize = 100;

pub fn build_client() -> reqwest::blocking::Client {
    reqwest::blocking::Client::builder()
        .user_agent("axol/0.1")
        .timeout(Duration::from_secs(30))
        .build()
        .expect("reqwest client config is valid")
}

/// Pages through Algolia's `search_by_date` newest-first, deduping hits by `objectID`
/// and stopping once `limit` (if any) is reached or pagination is exhausted.
pub fn search(
    client: &reqwest::blocking::Client,
    query: &str,
    limit: Option<usize>,
) -> Result<Vec<(Uid, RawRecord)>, AdapterError> {
    validate_search_query(query)?;

    let mut out = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut page = 0u32;

    loop {
        let resp = client
            .get(ALGOLIA_ENDPOINT)
            .query(&[
                ("query", query.to_string()),
                ("page", page.to_string()),
                ("hitsPerPage", HITS_PER_PAGE.to_string()),
            ])
            .send()
            .map_err(|e| AdapterError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(AdapterError::Transport(format!(
                "algolia returned status {}",
                resp.status()
            )));
        }

        let body: Value = resp
            .json()
            .map_err(|e| AdapterError::Transport(format!("invalid algolia response: {e}")))?;
        let hits = body
            .get("hits")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let nb_pages = body.get("nbPages").and_then(Value::as_u64).unwrap_or(0);

        if hits.is_empty() {
            break;
        }

        for hit in hits {
            let object_id = match hit.get("objectID").and_then(Value::as_str) {
                Some(s) => s.to_string(),
                None => continue,
            };
            if !seen.insert(object_id.clone()) {
                continue;
            }
            let uid = Uid::new(object_id)
                .map_err(|e| AdapterError::Transport(format!("bad objectID: {e}")))?;
            let data = RawRecord::from_json(&hit)
                .map_err(|e| AdapterError::Transport(format!("re-serializing hit: {e}")))?;
            out.push((uid, data));

            if let Some(n) = limit {
                if out.len() >= n {
                    return Ok(out);
                }
            }
        }

        page += 1;
        if page as u64 >= nb_pages {
            break;
        }
    }

    Ok(out)
}
