//! Custom error types for skyfall

use thiserror::Error;

/// Main error type for skyfall operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An insert hit the unique constraint on the source URL.
    /// Callers treat this as a skip, not a failure.
    #[error("Duplicate source URL: {0}")]
    Duplicate(String),

    #[error("Feed error: {0}")]
    Feed(String),

    #[error("Geocode error: {0}")]
    Geocode(String),

    #[error("Notify error: {0}")]
    Notify(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Error {
    /// True when an insert failed only because the row already exists.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Error::Duplicate(_))
    }
}

/// Result type alias for skyfall
pub type Result<T> = std::result::Result<T, Error>;
