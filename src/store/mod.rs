//! Durable storage for events and the geocode cache
//!
//! The UNIQUE constraint on events.source_url is the only concurrency
//! guard between the worker loop and any other process touching the
//! database: two writers can never both insert the same URL. Any
//! alternative backend must enforce the same invariant atomically.

mod schema;

pub use schema::SCHEMA_SQL;

use crate::error::{Error, Result};
use crate::models::{Event, GeocodeCacheEntry, NewEvent};
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::debug;

/// Events database handle
#[derive(Clone)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    /// Open (or create) the database and make sure the schema exists.
    pub async fn new(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        debug!("Connecting to SQLite database at {:?}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.init_schema().await?;
        Ok(db)
    }

    /// Initialize the database schema. Idempotent.
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    // ===== Event Operations =====

    /// True iff an event with this source URL is already persisted.
    pub async fn exists(&self, source_url: &str) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM events WHERE source_url = ?")
            .bind(source_url)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Insert a new event and return its row id.
    ///
    /// Returns `Error::Duplicate` when the source URL is already
    /// stored, whether from an earlier run or a concurrent writer.
    pub async fn insert_event(&self, event: &NewEvent) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO events (
                title, source_url, published_at, detected_at,
                country, region, city, latitude, longitude,
                raw_location_text
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&event.title)
        .bind(&event.source_url)
        .bind(&event.published_at)
        .bind(&event.detected_at)
        .bind(&event.country)
        .bind(&event.region)
        .bind(&event.city)
        .bind(event.latitude)
        .bind(event.longitude)
        .bind(&event.raw_location_text)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(done.last_insert_rowid()),
            Err(e) if is_unique_violation(&e) => Err(Error::Duplicate(event.source_url.clone())),
            Err(e) => Err(e.into()),
        }
    }

    /// List events newest-first, truncated to `limit`.
    pub async fn list_events(&self, limit: i64) -> Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(
            r#"
            SELECT id, title, source_url, published_at, detected_at,
                   country, region, city, latitude, longitude,
                   raw_location_text
            FROM events
            ORDER BY detected_at DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    // ===== Geocache Operations =====

    /// Look up a memoized geocode result by exact query string.
    pub async fn cached_geocode(&self, query: &str) -> Result<Option<GeocodeCacheEntry>> {
        let entry = sqlx::query_as::<_, GeocodeCacheEntry>(
            "SELECT query, latitude, longitude, display_name, created_at \
             FROM geocache WHERE query = ?",
        )
        .bind(query)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }

    /// Upsert a resolved place; last write wins.
    pub async fn cache_geocode(
        &self,
        query: &str,
        latitude: f64,
        longitude: f64,
        display_name: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO geocache (query, latitude, longitude, display_name, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(query) DO UPDATE SET
                latitude = excluded.latitude,
                longitude = excluded.longitude,
                display_name = excluded.display_name,
                created_at = excluded.created_at
            "#,
        )
        .bind(query)
        .bind(latitude)
        .bind(longitude)
        .bind(display_name)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.is_unique_violation(),
        _ => false,
    }
}
