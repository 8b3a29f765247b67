//! SQLite schema definition

/// SQL schema for the events database
pub const SCHEMA_SQL: &str = r#"
-- Events: one row per detected report, keyed by article URL
CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    source_url TEXT NOT NULL UNIQUE,
    published_at TEXT,
    detected_at TEXT NOT NULL,
    country TEXT,
    region TEXT,
    city TEXT,
    latitude REAL,
    longitude REAL,
    raw_location_text TEXT
);

-- Geocache: memoized place lookups, one row per query string
CREATE TABLE IF NOT EXISTS geocache (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    query TEXT NOT NULL UNIQUE,
    latitude REAL,
    longitude REAL,
    display_name TEXT,
    created_at TEXT NOT NULL
);

-- Indexes for performance
CREATE INDEX IF NOT EXISTS idx_events_detected ON events(detected_at);
"#;
