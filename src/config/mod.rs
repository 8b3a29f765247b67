//! Configuration management for skyfall
//!
//! Handles loading, saving, and validating configuration from TOML files.
//! Credentials never live in the file itself; the config names the
//! environment variables they are read from.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// News feed configuration
    #[serde(default)]
    pub feeds: FeedsConfig,

    /// Feed and article fetching configuration
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Geocoding configuration
    #[serde(default)]
    pub geocode: GeocodeConfig,

    /// Telegram notification configuration
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Worker loop configuration
    #[serde(default)]
    pub worker: WorkerConfig,

    /// Paths configuration (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

/// News feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedsConfig {
    /// Search query fed to the news RSS endpoint
    #[serde(default = "default_news_query")]
    pub query: String,

    /// Regional editions, one feed URL per entry ("US", "GB", ...)
    #[serde(default = "default_editions")]
    pub editions: Vec<String>,
}

/// Feed and article fetching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// User agent string sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,

    /// Cap on extracted article text, in characters
    #[serde(default = "default_article_max_chars")]
    pub article_max_chars: usize,
}

/// Geocoding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeConfig {
    /// Search endpoint URL
    #[serde(default = "default_geocode_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_geocode_timeout")]
    pub timeout_secs: u64,

    /// Minimum spacing between external calls, in milliseconds
    #[serde(default = "default_geocode_min_interval_ms")]
    pub min_interval_ms: u64,
}

/// Telegram notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot API base URL
    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,

    /// Environment variable name for the bot token
    #[serde(default = "default_bot_token_env")]
    pub bot_token_env: String,

    /// Environment variable name for the target chat id
    #[serde(default = "default_chat_id_env")]
    pub chat_id_env: String,
}

/// Worker loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Seconds to sleep after each scan cycle completes
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

/// Internal paths configuration
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    /// Base directory for skyfall data
    pub base_dir: PathBuf,

    /// Path to config file
    pub config_file: PathBuf,

    /// Path to SQLite database
    pub db_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feeds: FeedsConfig::default(),
            fetch: FetchConfig::default(),
            geocode: GeocodeConfig::default(),
            telegram: TelegramConfig::default(),
            worker: WorkerConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            query: default_news_query(),
            editions: default_editions(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_fetch_timeout(),
            article_max_chars: default_article_max_chars(),
        }
    }
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            endpoint: default_geocode_endpoint(),
            timeout_secs: default_geocode_timeout(),
            min_interval_ms: default_geocode_min_interval_ms(),
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: default_telegram_api_base(),
            bot_token_env: default_bot_token_env(),
            chat_id_env: default_chat_id_env(),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
        }
    }
}

impl Config {
    /// Get the default base directory for skyfall (~/.skyfall)
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".skyfall")
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        Self::default_base_dir().join("config.toml")
    }

    /// Initialize paths configuration
    fn init_paths(&mut self, base_dir: Option<PathBuf>) {
        let base = base_dir.unwrap_or_else(Self::default_base_dir);
        self.paths = PathsConfig {
            config_file: base.join("config.toml"),
            db_file: base.join("events.db"),
            base_dir: base,
        };
    }

    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        // Set up paths based on config file location
        let base = config_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        config.paths = PathsConfig {
            config_file: config_path.to_path_buf(),
            db_file: base.join("events.db"),
            base_dir: base,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific base directory, falling back
    /// to defaults if no config file exists there yet.
    pub fn load_from(base_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = Config::default();
        config.init_paths(base_dir);

        if config.paths.config_file.exists() {
            debug!("Loading config from {:?}", config.paths.config_file);
            let content = std::fs::read_to_string(&config.paths.config_file)?;
            let mut loaded: Config = toml::from_str(&content)?;
            loaded.paths = config.paths;
            config = loaded;
        } else {
            debug!("No config file found, using defaults");
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.paths.config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.paths.config_file, content)?;
        info!("Saved config to {:?}", self.paths.config_file);
        Ok(())
    }

    /// Resolve Telegram credentials from the environment.
    ///
    /// Missing or empty credentials are a startup failure: the worker
    /// must not run without somewhere to send alerts.
    pub fn telegram_credentials(&self) -> Result<(String, String)> {
        let token = require_env(&self.telegram.bot_token_env)?;
        let chat_id = require_env(&self.telegram.chat_id_env)?;
        Ok((token, chat_id))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.feeds.query.trim().is_empty() {
            return Err(Error::Config("feeds.query must not be empty".to_string()));
        }

        if self.feeds.editions.is_empty() {
            return Err(Error::Config(
                "feeds.editions must list at least one edition".to_string(),
            ));
        }

        if self.fetch.timeout_secs == 0 {
            return Err(Error::Config(
                "fetch.timeout_secs must be positive".to_string(),
            ));
        }

        if self.fetch.article_max_chars == 0 {
            return Err(Error::Config(
                "fetch.article_max_chars must be positive".to_string(),
            ));
        }

        if self.worker.poll_interval_secs == 0 {
            return Err(Error::Config(
                "worker.poll_interval_secs must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

fn require_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::Config(format!(
            "Missing required environment variable: {}",
            name
        ))),
    }
}
