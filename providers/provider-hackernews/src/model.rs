use axol_core::{ParseError, RawRecord};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashSet;

/// Hacker News entity, discriminated on read per the Algolia payload shape: presence of
/// a non-null `comment_text` means `Comment`; otherwise, if `objectID` equals the
/// (stringified) `story_id`, it's a top-level `Story`.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Comment {
        id: String,
        created_at: DateTime<Utc>,
        author: Option<String>,
        text: String,
    },
    Story {
        id: String,
        created_at: DateTime<Utc>,
        author: Option<String>,
        title: String,
        url: Option<String>,
        text: Option<String>,
        points: i64,
        num_comments: i64,
    },
}

fn take_str(obj: &mut serde_json::Map<String, Value>, key: &str) -> Option<String> {
    obj.remove(key).and_then(|v| match v {
        Value::String(s) => Some(s),
        Value::Null => None,
        other => Some(other.to_string()),
    })
}

fn take_i64(obj: &mut serde_json::Map<String, Value>, key: &str) -> i64 {
    obj.remove(key).and_then(|v| v.as_i64()).unwrap_or(0)
}

const IGNORED_KEYS: &[&str] = &[
    "_tags",
    "_highlightResult",
    "relevancy_score",
    "story_title",
    "story_url",
    "parent_id",
    "children",
    "type",
];

pub fn parse(data: &RawRecord) -> Result<Entity, ParseError> {
    let value: Value = serde_json::from_slice(data.as_bytes())
        .map_err(|e| ParseError::new(format!("invalid json: {e}")))?;
    let mut obj = match value {
        Value::Object(o) => o,
        _ => return Err(ParseError::new("expected a json object")),
    };

    let object_id = take_str(&mut obj, "objectID")
        .ok_or_else(|| ParseError::new("missing objectID"))?;
    let created_at_i = obj
        .remove("created_at_i")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| ParseError::new("missing created_at_i"))?;
    let created_at = DateTime::from_timestamp(created_at_i, 0)
        .ok_or_else(|| ParseError::new("invalid created_at_i"))?;
    let author = take_str(&mut obj, "author");
    let comment_text = take_str(&mut obj, "comment_text");
    let story_id = take_str(&mut obj, "story_id");

    let entity = if let Some(text) = comment_text {
        Entity::Comment {
            id: object_id,
            created_at,
            author,
            text,
        }
    } else if story_id.as_deref() == Some(object_id.as_str()) || story_id.is_none() {
        let title = take_str(&mut obj, "title").unwrap_or_default();
        let url = take_str(&mut obj, "url");
        let text = take_str(&mut obj, "story_text");
        let points = take_i64(&mut obj, "points");
        let num_comments = take_i64(&mut obj, "num_comments");
        Entity::Story {
            id: object_id,
            created_at,
            author,
            title,
            url,
            text,
            points,
            num_comments,
        }
    } else {
        return Err(ParseError::new(format!(
            "record {object_id} is neither a comment nor the top-level story {story_id:?}"
        )));
    };

    for key in IGNORED_KEYS {
        obj.remove(*key);
    }
    let leftover: HashSet<&str> = obj.keys().map(|s| s.as_str()).collect();
    if !leftover.is_empty() {
        return Err(ParseError::new(format!(
            "unrecognised hackernews fields: {leftover:?}"
        )));
    }

    Ok(entity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_story() {
        let json = serde_json::json!({
            "objectID": "29223181",
            "created_at_i": 1_648_000_000,
            "author": "pg",
            "title": "Some title",
            "url": "https://example.com",
            "story_text": null,
            "points": 120,
            "num_comments": 45,
            "story_id": "29223181",
            "comment_text": null,
        });
        let data = RawRecord::from_json(&json).unwrap();
        let entity = parse(&data).unwrap();
        assert_eq!(
            entity,
            Entity::Story {
                id: "29223181".into(),
                created_at: DateTime::from_timestamp(1_648_000_000, 0).unwrap(),
                author: Some("pg".into()),
                title: "Some title".into(),
                url: Some("https://example.com".into()),
                text: None,
                points: 120,
                num_comments: 45,
            }
        );
    }

    #[test]
    fn parses_comment() {
        let json = serde_json::json!({
            "objectID": "29223200",
            "created_at_i": 1_648_000_100,
            "author": "someone",
            "comment_text": "great post",
            "story_id": "29223181",
        });
        let data = RawRecord::from_json(&json).unwrap();
        let entity = parse(&data).unwrap();
        assert_eq!(
            entity,
            Entity::Comment {
                id: "29223200".into(),
                created_at: DateTime::from_timestamp(1_648_000_100, 0).unwrap(),
                author: Some("someone".into()),
                text: "great post".into(),
            }
        );
    }

    #[test]
    fn rejects_unknown_fields() {
        let json = serde_json::json!({
            "objectID": "1",
            "created_at_i": 1,
            "story_id": "1",
            "comment_text": null,
            "mystery_field": 42,
        });
        let data = RawRecord::from_json(&json).unwrap();
        assert!(parse(&data).is_err());
    }
}
