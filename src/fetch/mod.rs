//! Feed and article fetching
//!
//! Both fetch paths send the identifying User-Agent with a bounded
//! timeout; failures surface to the caller, which treats them as
//! per-feed or per-item degradation rather than aborting a scan.

use std::time::Duration;

use crate::config::FetchConfig;
use crate::error::{Error, Result};
use crate::feeds;
use crate::models::FeedItem;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

/// Create the shared HTTP client used for feed and article fetches.
pub fn create_client(config: &FetchConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .gzip(true)
        .build()?;
    Ok(client)
}

/// Fetch an RSS feed and parse its items.
pub async fn fetch_feed(client: &reqwest::Client, url: &Url) -> Result<Vec<FeedItem>> {
    debug!("Fetching feed: {}", url);
    let response = client.get(url.clone()).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Feed(format!("HTTP {}: {}", status, url)));
    }

    let content = response.text().await?;
    Ok(feeds::parse_feed(&content))
}

/// Fetch an article page and reduce it to plain text.
pub async fn fetch_article_text(
    client: &reqwest::Client,
    url: &str,
    max_chars: usize,
) -> Result<String> {
    debug!("Fetching article: {}", url);
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Feed(format!("HTTP {}: {}", status, url)));
    }

    let html = response.text().await?;
    Ok(article_text(&html, max_chars))
}

/// Reduce an HTML page to plain text: body only, script/style dropped,
/// blank lines removed, capped at `max_chars`.
pub fn article_text(html: &str, max_chars: usize) -> String {
    let document = Html::parse_document(html);

    let body = Selector::parse("body")
        .ok()
        .and_then(|s| document.select(&s).next().map(|e| e.html()))
        .unwrap_or_else(|| html.to_string());

    let text = html2text::from_read(body.as_bytes(), 80).unwrap_or_else(|_| body.clone());

    let collapsed = collapse_blank_lines(&text);
    collapsed.chars().take(max_chars).collect()
}

fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line.trim_end());
    }
    out
}
