use axol_core::{ParseError, RawRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub author: String,
    pub title: String,
    pub url: String,
    pub tags: Vec<String>,
    pub description: Option<String>,
}

pub fn parse(data: &RawRecord) -> Result<Bookmark, ParseError> {
    serde_json::from_slice(data.as_bytes())
        .map_err(|e| ParseError::new(format!("invalid pinboard bookmark: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bookmark() {
        let bm = Bookmark {
            slug: "u123abc".into(),
            created_at: Utc::now(),
            author: "alice".into(),
            title: "Rust book".into(),
            url: "https://doc.rust-lang.org/book/".into(),
            tags: vec!["rust".into(), "programming".into()],
            description: Some("the book".into()),
        };
        let data = RawRecord::from_json(&bm).unwrap();
        let parsed = parse(&data).unwrap();
        assert_eq!(parsed.slug, "u123abc");
        assert_eq!(parsed.tags, vec!["rust", "programming"]);
    }

    #[test]
    fn missing_fields_fail_to_parse() {
        let data = RawRecord::from_json(&serde_json::json!({"slug": "x"})).unwrap();
        assert!(parse(&data).is_err());
    }
}
