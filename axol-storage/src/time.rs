use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Seconds since the Unix epoch, UTC. Assigned once per `insert` call and shared by
/// every row written in that call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CrawlTimestamp(i64);

impl CrawlTimestamp {
    pub fn now() -> Self {
        CrawlTimestamp(Utc::now().timestamp())
    }

    pub fn from_secs(secs: i64) -> Self {
        CrawlTimestamp(secs)
    }

    pub fn as_secs(&self) -> i64 {
        self.0
    }

    pub fn to_datetime(&self) -> CrawlDt {
        Utc.timestamp_opt(self.0, 0)
            .single()
            .expect("CrawlTimestamp always round-trips through Utc")
    }
}

/// An aware UTC instant.
pub type CrawlDt = DateTime<Utc>;

impl From<CrawlDt> for CrawlTimestamp {
    fn from(dt: CrawlDt) -> Self {
        CrawlTimestamp(dt.timestamp())
    }
}
