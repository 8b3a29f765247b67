//! Outbound alert dispatch
//!
//! One Telegram sendMessage call per stored event. Failures surface
//! to the caller, which logs them and keeps the event: storage is
//! at-most-once, alerting is best-effort.

use std::time::Duration;

use crate::config::TelegramConfig;
use crate::error::{Error, Result};
use crate::models::NewEvent;
use serde_json::json;
use tracing::debug;

const SEND_TIMEOUT_SECS: u64 = 20;

/// Telegram sendMessage client.
pub struct Notifier {
    client: reqwest::Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl Notifier {
    pub fn new(config: &TelegramConfig, bot_token: String, chat_id: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(SEND_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            bot_token,
            chat_id,
        })
    }

    /// Send one alert message. Never retries.
    pub async fn send(&self, text: &str) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);
        let payload = json!({
            "chat_id": self.chat_id,
            "text": text,
            "disable_web_page_preview": true,
        });

        debug!("Sending alert to chat {}", self.chat_id);
        let response = self.client.post(&url).json(&payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Notify(format!("sendMessage returned HTTP {}", status)));
        }

        Ok(())
    }
}

/// Render the fixed alert template for a detected report.
pub fn format_message(event: &NewEvent) -> String {
    let parts: Vec<&str> = [
        event.country.as_deref(),
        event.region.as_deref(),
        event.city.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect();

    let location = if parts.is_empty() {
        event
            .raw_location_text
            .clone()
            .unwrap_or_else(|| "Unknown".to_string())
    } else {
        parts.join(", ")
    };

    let date = event
        .published_at
        .clone()
        .unwrap_or_else(|| event.detected_at.chars().take(10).collect());

    format!(
        "☄️ Meteorite fall report detected\n\n\
         📍 Location: {}\n\
         📅 Date: {}\n\
         📰 Source: {}\n",
        location, date, event.source_url
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn notifier_for(server: &MockServer) -> Notifier {
        let config = TelegramConfig {
            api_base: server.uri(),
            ..TelegramConfig::default()
        };
        Notifier::new(&config, "test-token".to_string(), "42".to_string()).unwrap()
    }

    #[test]
    fn test_format_message_full_location() {
        let mut event = NewEvent::new("Meteorite crashes into farmhouse", "http://x/1");
        event.country = Some("United States".to_string());
        event.city = Some("Columbus".to_string());
        event.published_at = Some("2026-08-04".to_string());

        let text = format_message(&event);
        assert!(text.contains("📍 Location: United States, Columbus"));
        assert!(text.contains("📅 Date: 2026-08-04"));
        assert!(text.contains("📰 Source: http://x/1"));
    }

    #[test]
    fn test_format_message_falls_back_to_raw_location() {
        let mut event = NewEvent::new("t", "http://x/1");
        event.raw_location_text = Some("somewhere remote".to_string());
        assert!(format_message(&event).contains("📍 Location: somewhere remote"));
    }

    #[test]
    fn test_format_message_unknown_location_and_detection_date() {
        let mut event = NewEvent::new("t", "http://x/1");
        event.detected_at = "2026-08-05T09:00:00+00:00".to_string();

        let text = format_message(&event);
        assert!(text.contains("📍 Location: Unknown"));
        assert!(text.contains("📅 Date: 2026-08-05"));
    }

    #[tokio::test]
    async fn test_send() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bottest-token/sendMessage"))
            .and(body_partial_json(serde_json::json!({
                "chat_id": "42",
                "disable_web_page_preview": true,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        notifier_for(&server).send("☄️ test alert").await.unwrap();
    }

    #[tokio::test]
    async fn test_send_non_success_is_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        assert!(notifier_for(&server).send("text").await.is_err());
    }
}
