//! Default values for configuration

/// Default news search query
pub fn default_news_query() -> String {
    "meteorite fell OR meteorite crash OR meteorite impact OR fireball landed".to_string()
}

/// Default regional feed editions (gl country codes)
pub fn default_editions() -> Vec<String> {
    ["US", "GB", "AU", "CA"].iter().map(|s| s.to_string()).collect()
}

/// Default user agent
pub fn default_user_agent() -> String {
    format!("skyfall/{} (Meteorite Fall Watcher)", env!("CARGO_PKG_VERSION"))
}

/// Default request timeout in seconds for feed and article fetches
pub fn default_fetch_timeout() -> u64 {
    20
}

/// Default cap on extracted article text, in characters
pub fn default_article_max_chars() -> usize {
    20_000
}

/// Default geocoding endpoint (Nominatim search)
pub fn default_geocode_endpoint() -> String {
    "https://nominatim.openstreetmap.org/search".to_string()
}

/// Default geocoding request timeout in seconds
pub fn default_geocode_timeout() -> u64 {
    10
}

/// Default minimum spacing between external geocode calls, in
/// milliseconds. Nominatim asks for at most one request per second.
pub fn default_geocode_min_interval_ms() -> u64 {
    1100
}

/// Default Telegram Bot API base URL
pub fn default_telegram_api_base() -> String {
    "https://api.telegram.org".to_string()
}

/// Default environment variable name for the bot token
pub fn default_bot_token_env() -> String {
    "TELEGRAM_BOT_TOKEN".to_string()
}

/// Default environment variable name for the target chat id
pub fn default_chat_id_env() -> String {
    "TELEGRAM_CHAT_ID".to_string()
}

/// Default worker poll interval in seconds
pub fn default_poll_interval() -> u64 {
    1800
}
