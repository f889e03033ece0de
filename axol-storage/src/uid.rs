use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

static UID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").unwrap());

/// Provider-assigned opaque identifier, stable across crawls.
///
/// Valid uids match `[A-Za-z0-9._-]+` and are 1-79 bytes long. Construction always goes
/// through [`Uid::new`]; there is no public way to build an unvalidated one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uid(String);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UidError {
    #[error("uid must not be empty")]
    Empty,
    #[error("uid too long: {0} bytes (max 79)")]
    TooLong(usize),
    #[error("uid contains invalid character {0:?}")]
    InvalidChar(char),
}

impl Uid {
    pub fn new(s: impl Into<String>) -> Result<Self, UidError> {
        let s = s.into();
        if s.is_empty() {
            return Err(UidError::Empty);
        }
        if s.len() > 79 {
            return Err(UidError::TooLong(s.len()));
        }
        if !UID_RE.is_match(&s) {
            let bad = s
                .chars()
                .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
                .expect("regex mismatch implies an offending char exists");
            return Err(UidError::InvalidChar(bad));
        }
        Ok(Uid(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Deref for Uid {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Uid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_typical_ids() {
        assert!(Uid::new("29223181").is_ok());
        assert!(Uid::new("code_ab12cd34").is_ok());
        assert!(Uid::new("08d0a5f0-eacd").is_ok());
        assert!(Uid::new("a.b.c").is_ok());
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(Uid::new("").unwrap_err(), UidError::Empty);
    }

    #[test]
    fn rejects_too_long() {
        let s = "a".repeat(80);
        assert_eq!(Uid::new(s).unwrap_err(), UidError::TooLong(80));
        assert!(Uid::new("a".repeat(79)).is_ok());
    }

    #[test]
    fn rejects_invalid_chars() {
        assert_eq!(Uid::new("a/b").unwrap_err(), UidError::InvalidChar('/'));
        assert_eq!(Uid::new("a b").unwrap_err(), UidError::InvalidChar(' '));
    }
}
