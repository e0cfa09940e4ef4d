//! Data models for stored articles, fetch log entries, and daily summaries.
//!
//! - [`Article`]: a schema-less upstream record with a derived identity key
//! - [`StoreDocument`]: the persisted article collection
//! - [`LogEntry`]: one line of the fetch log, either partial or complete
//! - [`DailySummary`]: per-day totals written to disk and delivered
//!
//! Timestamps are local wall-clock time without an offset, so a log written
//! on one machine reads back with the same calendar dates.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Source name used for the synthetic entry closing a fetch-all run.
pub const FETCH_ALL_SOURCE: &str = "FETCH_ALL_SUMMARY";
/// Category used for the synthetic entry closing a fetch-all run.
pub const FETCH_ALL_CATEGORY: &str = "multiple";
/// Category recorded when a fetch targets a source's root endpoint.
pub const ALL_CATEGORY: &str = "all";

/// A news article exactly as the upstream API returned it.
///
/// Upstream providers disagree on field names, so the record is kept as a
/// JSON object. Only a handful of well-known keys are read.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Article(Map<String, Value>);

impl Article {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn link(&self) -> Option<String> {
        self.text_field("link")
    }

    pub fn url(&self) -> Option<String> {
        self.text_field("url")
    }

    pub fn guid(&self) -> Option<String> {
        self.text_field("guid")
    }

    pub fn title(&self) -> Option<String> {
        self.text_field("title")
    }

    pub fn iso_date(&self) -> Option<String> {
        self.text_field("isoDate")
    }

    /// Key used to deduplicate the store.
    ///
    /// The first present `link`, `url` or `guid`, where null, `false`, zero,
    /// and empty strings, arrays or objects count as absent. Otherwise
    /// `"{title}-{isoDate}"` with missing parts rendered as empty strings.
    pub fn identity_key(&self) -> IdentityKey {
        ["link", "url", "guid"]
            .into_iter()
            .find_map(|key| self.identity_field(key))
            .unwrap_or_else(|| {
                IdentityKey::Text(format!(
                    "{}-{}",
                    self.title().unwrap_or_default(),
                    self.iso_date().unwrap_or_default()
                ))
            })
    }

    fn identity_field(&self, key: &str) -> Option<IdentityKey> {
        match self.0.get(key)? {
            Value::Null | Value::Bool(false) => None,
            Value::String(s) if s.is_empty() => None,
            Value::Array(a) if a.is_empty() => None,
            Value::Object(o) if o.is_empty() => None,
            Value::Number(n) if n.as_f64() == Some(0.0) => None,
            Value::String(s) => Some(IdentityKey::Text(s.clone())),
            other => Some(IdentityKey::Json(other.to_string())),
        }
    }

    // Null and empty strings count as absent; other scalars use their JSON text.
    fn text_field(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Deduplication key of an [`Article`].
///
/// A string link and a numeric link with the same text are different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdentityKey {
    Text(String),
    /// A non-string identifier, kept as its JSON text.
    Json(String),
}

/// The persisted article collection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StoreDocument {
    pub last_update: Option<NaiveDateTime>,
    #[serde(default)]
    pub articles: Vec<Article>,
}

/// Counters produced by one merge into the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MergeStats {
    pub incoming: u64,
    pub added: u64,
    pub duplicates: u64,
    pub total_after: u64,
}

/// What a log entry knows about its fetch.
///
/// Per-item entries of a fetch-all run only know how many articles came in;
/// the store merge happens once at the end of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchCounts {
    Partial { incoming: u64 },
    Complete(MergeStats),
}

impl FetchCounts {
    pub fn incoming(&self) -> u64 {
        match self {
            FetchCounts::Partial { incoming } => *incoming,
            FetchCounts::Complete(stats) => stats.incoming,
        }
    }

    pub fn complete(&self) -> Option<&MergeStats> {
        match self {
            FetchCounts::Partial { .. } => None,
            FetchCounts::Complete(stats) => Some(stats),
        }
    }
}

/// One line of the fetch log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "LogRecord", into = "LogRecord")]
pub struct LogEntry {
    pub timestamp: NaiveDateTime,
    pub source: String,
    pub category: String,
    pub counts: FetchCounts,
}

impl LogEntry {
    pub fn complete(
        timestamp: NaiveDateTime,
        source: impl Into<String>,
        category: impl Into<String>,
        stats: MergeStats,
    ) -> Self {
        Self {
            timestamp,
            source: source.into(),
            category: category.into(),
            counts: FetchCounts::Complete(stats),
        }
    }

    pub fn partial(
        timestamp: NaiveDateTime,
        source: impl Into<String>,
        category: impl Into<String>,
        incoming: u64,
    ) -> Self {
        Self {
            timestamp,
            source: source.into(),
            category: category.into(),
            counts: FetchCounts::Partial { incoming },
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

/// Flat on-disk shape of a [`LogEntry`]; counters are nullable.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LogRecord {
    timestamp: NaiveDateTime,
    source: String,
    category: String,
    incoming: Option<i64>,
    added: Option<i64>,
    duplicates: Option<i64>,
    total_after: Option<i64>,
}

// Older logs may hold negative counters; they read back as zero.
fn read_count(v: i64) -> u64 {
    u64::try_from(v).unwrap_or(0)
}

fn write_count(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

impl From<LogRecord> for LogEntry {
    fn from(r: LogRecord) -> Self {
        let incoming = r.incoming.map_or(0, read_count);
        let counts = match (
            r.added.map(read_count),
            r.duplicates.map(read_count),
            r.total_after.map(read_count),
        ) {
            (Some(added), Some(duplicates), Some(total_after)) => FetchCounts::Complete(MergeStats {
                incoming,
                added,
                duplicates,
                total_after,
            }),
            _ => FetchCounts::Partial { incoming },
        };
        LogEntry {
            timestamp: r.timestamp,
            source: r.source,
            category: r.category,
            counts,
        }
    }
}

impl From<LogEntry> for LogRecord {
    fn from(e: LogEntry) -> Self {
        let (incoming, added, duplicates, total_after) = match e.counts {
            FetchCounts::Partial { incoming } => (Some(write_count(incoming)), None, None, None),
            FetchCounts::Complete(s) => (
                Some(write_count(s.incoming)),
                Some(write_count(s.added)),
                Some(write_count(s.duplicates)),
                Some(write_count(s.total_after)),
            ),
        };
        LogRecord {
            timestamp: e.timestamp,
            source: e.source,
            category: e.category,
            incoming,
            added,
            duplicates,
            total_after,
        }
    }
}

/// Summed counters for one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceCounts {
    pub incoming: u64,
    pub added: u64,
    pub duplicates: u64,
}

impl SourceCounts {
    pub fn add(&mut self, stats: &MergeStats) {
        self.incoming += stats.incoming;
        self.added += stats.added;
        self.duplicates += stats.duplicates;
    }
}

/// Totals for a single calendar day, one file per date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub total_incoming: u64,
    pub total_added: u64,
    pub total_duplicates: u64,
    pub per_source: BTreeMap<String, SourceCounts>,
    pub generated_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn article(value: Value) -> Article {
        serde_json::from_value(value).unwrap()
    }

    fn ts(s: &str) -> NaiveDateTime {
        s.parse().unwrap()
    }

    #[test]
    fn test_identity_key_prefers_link() {
        let a = article(json!({"link": "l", "url": "u", "guid": "g"}));
        assert_eq!(a.identity_key(), IdentityKey::Text("l".into()));
    }

    #[test]
    fn test_identity_key_falls_through_empty_values() {
        let a = article(json!({"link": "", "url": null, "guid": "g"}));
        assert_eq!(a.identity_key(), IdentityKey::Text("g".into()));
    }

    #[test]
    fn test_identity_key_synthetic() {
        let a = article(json!({"title": "Banjir Jakarta", "isoDate": "2025-01-02T03:04:05Z"}));
        assert_eq!(
            a.identity_key(),
            IdentityKey::Text("Banjir Jakarta-2025-01-02T03:04:05Z".into())
        );
    }

    #[test]
    fn test_identity_key_synthetic_empty() {
        let dash = IdentityKey::Text("-".into());
        assert_eq!(article(json!({})).identity_key(), dash);
        assert_eq!(article(json!({"title": "", "isoDate": ""})).identity_key(), dash);
    }

    #[test]
    fn test_identity_key_skips_falsy_values() {
        let a = article(json!({"link": false, "url": 0, "guid": [], "title": "t"}));
        assert_eq!(a.identity_key(), IdentityKey::Text("t-".into()));
        let b = article(json!({"link": {}, "url": 0.0, "guid": "g"}));
        assert_eq!(b.identity_key(), IdentityKey::Text("g".into()));
        let c = article(json!({"link": false, "url": "u"}));
        assert_eq!(c.identity_key(), IdentityKey::Text("u".into()));
    }

    #[test]
    fn test_identity_key_number_differs_from_string() {
        let num = article(json!({"link": 1}));
        let text = article(json!({"link": "1"}));
        assert_eq!(num.identity_key(), IdentityKey::Json("1".into()));
        assert_ne!(num.identity_key(), text.identity_key());
    }

    #[test]
    fn test_article_keeps_unknown_fields() {
        let a = article(json!({"link": "u1", "image": {"small": "s.jpg"}}));
        let back = serde_json::to_value(&a).unwrap();
        assert_eq!(back["image"]["small"], "s.jpg");
    }

    #[test]
    fn test_store_document_empty_default() {
        let doc: StoreDocument = serde_json::from_str(r#"{"last_update": null, "articles": []}"#).unwrap();
        assert_eq!(doc, StoreDocument::default());
    }

    #[test]
    fn test_log_entry_complete_wire_format() {
        let entry = LogEntry::complete(
            ts("2025-03-01T10:00:00"),
            "CNN News",
            "nasional",
            MergeStats { incoming: 2, added: 2, duplicates: 0, total_after: 2 },
        );
        let v = serde_json::to_value(&entry).unwrap();
        assert_eq!(v["source"], "CNN News");
        assert_eq!(v["incoming"], 2);
        assert_eq!(v["total_after"], 2);
    }

    #[test]
    fn test_log_entry_partial_writes_nulls() {
        let entry = LogEntry::partial(ts("2025-03-01T10:00:00"), "Vice", "all", 9);
        let v = serde_json::to_value(&entry).unwrap();
        assert_eq!(v["incoming"], 9);
        assert!(v["added"].is_null());
        assert!(v["duplicates"].is_null());
        assert!(v["total_after"].is_null());
    }

    #[test]
    fn test_log_entry_reads_python_timestamp() {
        let line = r#"{"timestamp": "2025-03-01T10:00:00.123456", "source": "BBC News", "category": "dunia", "incoming": 4, "added": null, "duplicates": null, "total_after": null}"#;
        let entry: LogEntry = serde_json::from_str(line).unwrap();
        assert_eq!(entry.counts, FetchCounts::Partial { incoming: 4 });
        assert_eq!(entry.date(), NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
    }

    #[test]
    fn test_log_entry_half_filled_is_partial() {
        let line = r#"{"timestamp": "2025-03-01T10:00:00", "source": "x", "category": "all", "incoming": 3, "added": 1, "duplicates": null, "total_after": 7}"#;
        let entry: LogEntry = serde_json::from_str(line).unwrap();
        assert!(entry.counts.complete().is_none());
        assert_eq!(entry.counts.incoming(), 3);
    }

    #[test]
    fn test_log_entry_negative_counter_reads_as_zero() {
        let line = r#"{"timestamp": "2025-03-01T10:00:00", "source": "FETCH_ALL_SUMMARY", "category": "multiple", "incoming": 5, "added": 7, "duplicates": -2, "total_after": 30}"#;
        let entry: LogEntry = serde_json::from_str(line).unwrap();
        assert_eq!(
            entry.counts,
            FetchCounts::Complete(MergeStats { incoming: 5, added: 7, duplicates: 0, total_after: 30 })
        );
    }
}
