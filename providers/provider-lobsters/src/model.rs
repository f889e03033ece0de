use axol_core::{ParseError, RawRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Entity {
    Story {
        dt: DateTime<Utc>,
        id: String,
        title: String,
        url: String,
        author: String,
        permalink: String,
    },
    Comment {
        dt: DateTime<Utc>,
        id: String,
        title: String,
        url: String,
        author: String,
        permalink: String,
    },
}

/// Intermediate shape the scraper emits before `parse` tags it with a kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Row {
    pub kind: String,
    pub dt: DateTime<Utc>,
    pub id: String,
    pub title: String,
    pub url: String,
    pub author: String,
    pub permalink: String,
}

pub fn parse(data: &RawRecord) -> Result<Entity, ParseError> {
    let row: Row = serde_json::from_slice(data.as_bytes())
        .map_err(|e| ParseError::new(format!("invalid lobsters row: {e}")))?;
    let entity = match row.kind.as_str() {
        "story" => Entity::Story {
            dt: row.dt,
            id: row.id,
            title: row.title,
            url: row.url,
            author: row.author,
            permalink: row.permalink,
        },
        "comment" => Entity::Comment {
            dt: row.dt,
            id: row.id,
            title: row.title,
            url: row.url,
            author: row.author,
            permalink: row.permalink,
        },
        other => return Err(ParseError::new(format!("unknown lobsters row kind {other:?}"))),
    };
    Ok(entity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_story() {
        let row = Row {
            kind: "story".into(),
            dt: Utc::now(),
            id: "abc123".into(),
            title: "Rust 2.0".into(),
            url: "https://example.com".into(),
            author: "alice".into(),
            permalink: "https://lobste.rs/s/abc123".into(),
        };
        let data = RawRecord::from_json(&row).unwrap();
        match parse(&data).unwrap() {
            Entity::Story { id, title, .. } => {
                assert_eq!(id, "abc123");
                assert_eq!(title, "Rust 2.0");
            }
            other => panic!("expected Story, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_kind() {
        let mut row = serde_json::to_value(Row {
            kind: "story".into(),
            dt: Utc::now(),
            id: "x".into(),
            title: "t".into(),
            url: "u".into(),
            author: "a".into(),
            permalink: "p".into(),
        })
        .unwrap();
        row["kind"] = serde_json::Value::String("vote".into());
        let data = RawRecord::from_json(&row).unwrap();
        assert!(parse(&data).is_err());
    }
}
