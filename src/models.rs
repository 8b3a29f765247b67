//! Core data structures for the ingestion pipeline.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A stored meteorite-fall report, keyed by its article URL.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub source_url: String,
    /// ISO calendar date from the article, when one could be parsed.
    pub published_at: Option<String>,
    /// RFC 3339 UTC timestamp of ingestion. Always set.
    pub detected_at: String,
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// The text the geocode query was built from.
    pub raw_location_text: Option<String>,
}

/// A report ready to be persisted. Events are insert-only; there is no
/// update path once a row exists.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub title: String,
    pub source_url: String,
    pub published_at: Option<String>,
    pub detected_at: String,
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub raw_location_text: Option<String>,
}

impl NewEvent {
    /// Create a bare event stamped with the current detection time.
    pub fn new(title: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source_url: source_url.into(),
            published_at: None,
            detected_at: chrono::Utc::now().to_rfc3339(),
            country: None,
            region: None,
            city: None,
            latitude: None,
            longitude: None,
            raw_location_text: None,
        }
    }
}

/// One item pulled out of an RSS feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub published: Option<String>,
    pub summary: String,
}

/// Location guess extracted from article text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationGuess {
    pub city: Option<String>,
    /// No sub-national extraction; always None in the current design.
    pub region: Option<String>,
    pub country: Option<String>,
    pub raw_location_text: Option<String>,
}

/// Resolved coordinates for a place query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: Option<String>,
}

/// A memoized geocode lookup.
#[derive(Debug, Clone, FromRow)]
pub struct GeocodeCacheEntry {
    pub query: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub display_name: Option<String>,
    pub created_at: String,
}

/// Why a feed item was dropped without becoming an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The item carried no link to dedup on.
    MissingLink,
    /// The URL is already stored.
    AlreadySeen,
    /// The keyword filter rejected it.
    NotCandidate,
    /// The insert lost a race against another writer for the same URL.
    Duplicate,
}

/// Outcome of processing a single feed item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Inserted { id: i64, event: NewEvent },
    Skipped(SkipReason),
    Failed(String),
}

/// Tally for one scan cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanStats {
    pub new_events: u32,
    pub already_seen: u32,
    pub filtered_out: u32,
    pub duplicates: u32,
    pub failed_items: u32,
    pub notify_failures: u32,
    pub failed_feeds: u32,
}

impl ScanStats {
    /// Fold one item outcome into the tally.
    pub fn record(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Inserted { .. } => self.new_events += 1,
            ItemOutcome::Skipped(SkipReason::MissingLink) => self.filtered_out += 1,
            ItemOutcome::Skipped(SkipReason::AlreadySeen) => self.already_seen += 1,
            ItemOutcome::Skipped(SkipReason::NotCandidate) => self.filtered_out += 1,
            ItemOutcome::Skipped(SkipReason::Duplicate) => self.duplicates += 1,
            ItemOutcome::Failed(_) => self.failed_items += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_outcomes() {
        let mut stats = ScanStats::default();
        stats.record(&ItemOutcome::Inserted {
            id: 1,
            event: NewEvent::new("t", "http://x/1"),
        });
        stats.record(&ItemOutcome::Skipped(SkipReason::AlreadySeen));
        stats.record(&ItemOutcome::Skipped(SkipReason::NotCandidate));
        stats.record(&ItemOutcome::Skipped(SkipReason::Duplicate));
        stats.record(&ItemOutcome::Failed("boom".into()));

        assert_eq!(stats.new_events, 1);
        assert_eq!(stats.already_seen, 1);
        assert_eq!(stats.filtered_out, 1);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(stats.failed_items, 1);
    }
}
