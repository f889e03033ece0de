use axol_core::{AdapterError, RawRecord, Uid};
use axol_credentials::RedditCredentials;
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;

/// The Reddit search API truncates each individual sort order well before it exhausts
/// the matching set, so the adapter repeats the same query under every sort order and
/// unions the results by uid.
const SORT_ORDERS: &[&str] = &["relevance", "hot", "top", "new", "comments"];
const PAGE_SIZE: u32 = 100;

pub struct RedditClient {
    http: reqwest::blocking::Client,
    access_token: String,
}

impl RedditClient {
    pub fn authenticate(creds: &RedditCredentials) -> Result<Self, AdapterError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(creds.user_agent.clone())
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AdapterError::Transport(e.to_string()))?;

        let resp = http
            .post("https://www.reddit.com/api/v1/access_token")
            .basic_auth(&creds.client_id, Some(&creds.client_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", &creds.username),
                ("password", &creds.password),
            ])
            .send()
            .map_err(|e| AdapterError::Transport(format!("reddit auth failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AdapterError::Transport(format!(
                "reddit auth returned status {}",
                resp.status()
            )));
        }
        let body: Value = resp
            .json()
            .map_err(|e| AdapterError::Transport(format!("invalid auth response: {e}")))?;
        let access_token = body
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| AdapterError::Transport("missing access_token in reddit auth response".into()))?
            .to_string();

        Ok(RedditClient { http, access_token })
    }

    pub fn search(
        &self,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<(Uid, RawRecord)>, AdapterError> {
        let mut out = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for sort in SORT_ORDERS {
            let mut after: Option<String> = None;
            let mut seen_this_sort: HashSet<String> = HashSet::new();
            loop {
                let mut qs = vec![
                    ("q", query.to_string()),
                    ("sort", sort.to_string()),
                    ("limit", PAGE_SIZE.to_string()),
                    ("restrict_sr", "off".to_string()),
                ];
                if let Some(a) = &after {
                    qs.push(("after", a.clone()));
                }

                let resp = self
                    .http
                    .get("https://oauth.reddit.com/search")
                    .bearer_auth(&self.access_token)
                    .query(&qs)
                    .send()
                    .map_err(|e| AdapterError::Transport(e.to_string()))?;

                if !resp.status().is_success() {
                    return Err(AdapterError::Transport(format!(
                        "reddit search returned status {}",
                        resp.status()
                    )));
                }

                let body: Value = resp
                    .json()
                    .map_err(|e| AdapterError::Transport(format!("invalid search response: {e}")))?;
                let children = body
                    .pointer("/data/children")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default();

                if children.is_empty() {
                    break;
                }

                for child in &children {
                    let data = child.get("data").cloned().unwrap_or(Value::Null);
                    let id = match data.get("id").and_then(Value::as_str) {
                        Some(s) => s.to_string(),
                        None => continue,
                    };
                    if !seen_this_sort.insert(id.clone()) {
                        // A single sort order must never repeat an id within one
                        // pagination pass; a repeat means the API contract we rely on
                        // (each page advancing past the last) has broken.
                        return Err(AdapterError::DuplicateUid(id));
                    }
                    if !seen.insert(id.clone()) {
                        continue;
                    }
                    let uid = Uid::new(id)
                        .map_err(|e| AdapterError::Transport(format!("bad submission id: {e}")))?;
                    let record = RawRecord::from_json(&data)
                        .map_err(|e| AdapterError::Transport(format!("re-serializing submission: {e}")))?;
                    out.push((uid, record));

                    if let Some(n) = limit {
                        if out.len() >= n {
                            return Ok(out);
                        }
                    }
                }

                after = body
                    .pointer("/data/after")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                if after.is_none() {
                    break;
                }
            }
        }

        Ok(out)
    }
}
