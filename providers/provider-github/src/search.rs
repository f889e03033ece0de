use crate::query::{Kind, SearchQuery};
use axol_core::{AdapterError, RawRecord, Uid};
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;

const PAGE_SIZE: u32 = 100;
/// After this many items with zero new additions within one (sort, order) pass, stop
/// paginating it — the remainder is assumed to be duplicates of what earlier passes
/// already surfaced.
const EARLY_EXIT_THRESHOLD: usize = 50;

fn sorts_for(kind: Kind) -> &'static [&'static str] {
    match kind {
        Kind::Code => &["indexed"],
        Kind::Commit => &["author-date", "committer-date"],
        Kind::Issue => &["comments", "created", "updated"],
        Kind::Repository => &["stars", "forks", "updated"],
    }
}

/// Issue search results carry only `repository_url`, unlike code/commit results which
/// embed a full `repository` object; pull the `owner/name` out of the URL so `model::parse`
/// has a uniform `__axol_repo` field to read for issues.
fn repo_from_issue_url(item: &Value) -> Option<String> {
    let url = item.get("repository_url").and_then(Value::as_str)?;
    let mut parts = url.rsplit('/');
    let name = parts.next()?;
    let owner = parts.next()?;
    Some(format!("{owner}/{name}"))
}

fn uid_for(kind: Kind, item: &Value) -> Option<String> {
    match kind {
        Kind::Code => item.get("sha").and_then(Value::as_str).map(|s| format!("code_{s}")),
        Kind::Commit => item.get("sha").and_then(Value::as_str).map(|s| format!("commit_{s}")),
        Kind::Issue => item
            .get("number")
            .and_then(Value::as_i64)
            .map(|n| format!("issue_{n}")),
        Kind::Repository => {
            let full_name = item.get("full_name").and_then(Value::as_str)?;
            let (owner, name) = full_name.split_once('/')?;
            Some(format!("repo_{owner}_{name}"))
        }
    }
}

pub struct GithubClient {
    http: reqwest::blocking::Client,
}

impl GithubClient {
    pub fn new(token: &str) -> Result<Self, AdapterError> {
        let mut headers = reqwest::header::HeaderMap::new();
        let auth = format!("token {token}");
        headers.insert(
            reqwest::header::AUTHORIZATION,
            auth.parse().map_err(|_| AdapterError::Transport("invalid token".into()))?,
        );
        headers.insert(
            reqwest::header::ACCEPT,
            "application/vnd.github+json".parse().unwrap(),
        );
        let http = reqwest::blocking::Client::builder()
            .user_agent("axol/0.1")
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AdapterError::Transport(e.to_string()))?;
        Ok(GithubClient { http })
    }

    pub fn search(
        &self,
        query: &SearchQuery,
        limit: Option<usize>,
    ) -> Result<Vec<(Uid, RawRecord)>, AdapterError> {
        if query.text.contains('\'') {
            return Err(AdapterError::InvalidQuery(format!(
                "github search query must not contain a single quote: {:?}",
                query.text
            )));
        }

        let mut out = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        // Best-match pass first (no explicit sort), then every (sort, order) pair.
        let mut passes: Vec<(Option<&str>, Option<&str>)> = vec![(None, None)];
        for sort in sorts_for(query.kind) {
            passes.push((Some(sort), Some("asc")));
            passes.push((Some(sort), Some("desc")));
        }

        for (sort, order) in passes {
            let mut page = 1u32;
            let mut additions_without_new = 0usize;
            loop {
                let mut qs = vec![
                    ("q", query.text.clone()),
                    ("per_page", PAGE_SIZE.to_string()),
                    ("page", page.to_string()),
                ];
                if let Some(s) = sort {
                    qs.push(("sort", s.to_string()));
                }
                if let Some(o) = order {
                    qs.push(("order", o.to_string()));
                }

                let url = format!("https://api.github.com/search/{}", query.kind.endpoint());
                let resp = self
                    .http
                    .get(&url)
                    .query(&qs)
                    .send()
                    .map_err(|e| AdapterError::Transport(e.to_string()))?;

                if resp.status() == reqwest::StatusCode::FORBIDDEN {
                    return Err(AdapterError::Transport("github rate limit exceeded".into()));
                }
                if !resp.status().is_success() {
                    return Err(AdapterError::Transport(format!(
                        "github search returned status {}",
                        resp.status()
                    )));
                }

                let body: Value = resp
                    .json()
                    .map_err(|e| AdapterError::Transport(format!("invalid search response: {e}")))?;
                let items = body.get("items").and_then(Value::as_array).cloned().unwrap_or_default();
                if items.is_empty() {
                    break;
                }

                let mut new_in_page = 0usize;
                for mut item in items {
                    let Some(uid_str) = uid_for(query.kind, &item) else {
                        continue;
                    };
                    if !seen.insert(uid_str.clone()) {
                        continue;
                    }
                    new_in_page += 1;
                    if let Value::Object(ref mut obj) = item {
                        let kind_tag = match query.kind {
                            Kind::Code => "code",
                            Kind::Commit => "commit",
                            Kind::Issue => "issue",
                            Kind::Repository => "repository",
                        };
                        obj.insert("__axol_kind".into(), Value::String(kind_tag.into()));
                        if matches!(query.kind, Kind::Issue) {
                            if let Some(repo) = repo_from_issue_url(&Value::Object(obj.clone())) {
                                obj.insert("__axol_repo".into(), Value::String(repo));
                            }
                        }
                    }
                    let uid = Uid::new(uid_str)
                        .map_err(|e| AdapterError::Transport(format!("bad github uid: {e}")))?;
                    let record = RawRecord::from_json(&item)
                        .map_err(|e| AdapterError::Transport(format!("re-serializing item: {e}")))?;
                    out.push((uid, record));

                    if let Some(n) = limit {
                        if out.len() >= n {
                            return Ok(out);
                        }
                    }
                }

                if new_in_page == 0 {
                    additions_without_new += PAGE_SIZE as usize;
                } else {
                    additions_without_new = 0;
                }
                if additions_without_new >= EARLY_EXIT_THRESHOLD {
                    break;
                }

                page += 1;
                if (page as u64 - 1) * PAGE_SIZE as u64 >= body.get("total_count").and_then(Value::as_u64).unwrap_or(0) {
                    break;
                }
            }
        }

        Ok(out)
    }
}
