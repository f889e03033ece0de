use axol_core::{ParseError, RawRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reddit carries no comment search in this adapter (the search API only finds
/// submissions), so there is a single entity shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub subreddit: String,
    pub author: Option<String>,
    pub ups: i64,
    pub downs: i64,
    pub title: String,
    pub url: String,
    pub permalink: String,
    pub body_md: String,
    pub body_html: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSubmission {
    id: String,
    created_utc: f64,
    subreddit: String,
    author: Option<String>,
    ups: i64,
    #[serde(default)]
    downs: i64,
    title: String,
    url: String,
    permalink: String,
    #[serde(default)]
    selftext: String,
    selftext_html: Option<String>,
}

pub fn parse(data: &RawRecord) -> Result<Submission, ParseError> {
    let raw: RawSubmission = serde_json::from_slice(data.as_bytes())
        .map_err(|e| ParseError::new(format!("invalid reddit submission json: {e}")))?;
    let created_at = DateTime::from_timestamp(raw.created_utc as i64, 0)
        .ok_or_else(|| ParseError::new("invalid created_utc"))?;
    Ok(Submission {
        id: raw.id,
        created_at,
        subreddit: raw.subreddit,
        author: raw.author.filter(|a| a != "[deleted]"),
        ups: raw.ups,
        downs: raw.downs,
        title: raw.title,
        url: raw.url,
        permalink: raw.permalink,
        body_md: raw.selftext,
        body_html: raw.selftext_html,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_submission() {
        let json = serde_json::json!({
            "id": "u1t237",
            "created_utc": 1_700_000_000.0,
            "subreddit": "rust",
            "author": "someone",
            "ups": 42,
            "downs": 0,
            "title": "A post",
            "url": "https://reddit.com/r/rust/comments/u1t237/a_post",
            "permalink": "/r/rust/comments/u1t237/a_post/",
            "selftext": "body text",
            "selftext_html": null,
        });
        let data = RawRecord::from_json(&json).unwrap();
        let sub = parse(&data).unwrap();
        assert_eq!(sub.id, "u1t237");
        assert_eq!(sub.subreddit, "rust");
        assert_eq!(sub.ups, 42);
    }

    #[test]
    fn deleted_author_becomes_none() {
        let json = serde_json::json!({
            "id": "x",
            "created_utc": 1.0,
            "subreddit": "rust",
            "author": "[deleted]",
            "ups": 1,
            "downs": 0,
            "title": "t",
            "url": "https://reddit.com",
            "permalink": "/p",
            "selftext": "",
            "selftext_html": null,
        });
        let data = RawRecord::from_json(&json).unwrap();
        assert_eq!(parse(&data).unwrap().author, None);
    }
}
