use axol_core::{ParseError, RawRecord};
use chrono::{DateTime, Utc};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Code {
        html_url: String,
        repo: String,
        path: String,
    },
    Commit {
        sha: String,
        created_at: Option<DateTime<Utc>>,
        html_url: String,
        repo: String,
        author: Option<String>,
        message: String,
    },
    Issue {
        number: i64,
        created_at: DateTime<Utc>,
        html_url: String,
        repo: String,
        author: Option<String>,
        title: String,
        is_pull_request: bool,
    },
    Repository {
        html_url: String,
        repo: String,
        created_at: Option<DateTime<Utc>>,
        description: Option<String>,
        stars: i64,
    },
}

fn parse_dt(v: Option<&Value>) -> Option<DateTime<Utc>> {
    v.and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn repo_full_name(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(|r| r.get("full_name"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Each GitHub kind is stored with a leading discriminator so `parse` doesn't need to
/// guess the shape back out of an otherwise-ambiguous payload.
pub fn parse(data: &RawRecord) -> Result<Entity, ParseError> {
    let value: Value = serde_json::from_slice(data.as_bytes())
        .map_err(|e| ParseError::new(format!("invalid json: {e}")))?;
    let kind = value
        .get("__axol_kind")
        .and_then(Value::as_str)
        .ok_or_else(|| ParseError::new("missing __axol_kind discriminator"))?;

    let entity = match kind {
        "code" => Entity::Code {
            html_url: value.get("html_url").and_then(Value::as_str).unwrap_or_default().into(),
            repo: repo_full_name(&value, "repository"),
            path: value.get("path").and_then(Value::as_str).unwrap_or_default().into(),
        },
        "commit" => Entity::Commit {
            sha: value.get("sha").and_then(Value::as_str).unwrap_or_default().into(),
            created_at: parse_dt(value.pointer("/commit/author/date")),
            html_url: value.get("html_url").and_then(Value::as_str).unwrap_or_default().into(),
            repo: repo_full_name(&value, "repository"),
            author: value
                .pointer("/author/login")
                .and_then(Value::as_str)
                .map(str::to_string),
            message: value
                .pointer("/commit/message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .into(),
        },
        "issue" => Entity::Issue {
            number: value.get("number").and_then(Value::as_i64).unwrap_or_default(),
            created_at: parse_dt(value.get("created_at"))
                .ok_or_else(|| ParseError::new("issue missing created_at"))?,
            html_url: value.get("html_url").and_then(Value::as_str).unwrap_or_default().into(),
            repo: value
                .get("__axol_repo")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .into(),
            author: value
                .pointer("/user/login")
                .and_then(Value::as_str)
                .map(str::to_string),
            title: value.get("title").and_then(Value::as_str).unwrap_or_default().into(),
            is_pull_request: value.get("pull_request").is_some(),
        },
        "repository" => Entity::Repository {
            html_url: value.get("html_url").and_then(Value::as_str).unwrap_or_default().into(),
            repo: value.get("full_name").and_then(Value::as_str).unwrap_or_default().into(),
            created_at: parse_dt(value.get("created_at")),
            description: value
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
            stars: value
                .get("stargazers_count")
                .and_then(Value::as_i64)
                .unwrap_or_default(),
        },
        other => return Err(ParseError::new(format!("unknown github kind {other:?}"))),
    };
    Ok(entity)
}
