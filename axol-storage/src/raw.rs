use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// Opaque persisted bytes produced by a provider adapter (typically JSON, sometimes an
/// HTML fragment). The core never interprets these bytes itself; only the owning
/// adapter's `parse` does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Vec<u8>);

impl RawRecord {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        RawRecord(bytes.into())
    }

    pub fn from_json(value: &impl Serialize) -> serde_json::Result<Self> {
        Ok(RawRecord(serde_json::to_vec(value)?))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }
}

impl Deref for RawRecord {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for RawRecord {
    fn from(v: Vec<u8>) -> Self {
        RawRecord(v)
    }
}

impl From<String> for RawRecord {
    fn from(s: String) -> Self {
        RawRecord(s.into_bytes())
    }
}
