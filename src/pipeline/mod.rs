//! The scan cycle and worker loop
//!
//! Each feed and each item fails in isolation: a dead feed skips to
//! the next feed, a failed enrichment degrades to empty fields, and a
//! duplicate insert is a skip. Only startup configuration problems
//! are allowed to stop the worker.

use std::time::Duration;

use crate::classify;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::feeds;
use crate::fetch;
use crate::geocode::Resolver;
use crate::models::{FeedItem, ItemOutcome, NewEvent, ScanStats, SkipReason};
use crate::notify::{self, Notifier};
use crate::store::Db;
use chrono::Utc;
use tracing::{info, warn};
use url::Url;

/// Run one scan cycle over the supplied feed URLs.
pub async fn run_once(
    config: &Config,
    client: &reqwest::Client,
    db: &Db,
    resolver: &Resolver,
    notifier: Option<&Notifier>,
    feed_urls: &[Url],
) -> Result<ScanStats> {
    let mut stats = ScanStats::default();

    for feed_url in feed_urls {
        let items = match fetch::fetch_feed(client, feed_url).await {
            Ok(items) => items,
            Err(e) => {
                warn!("Feed fetch failed: {} :: {}", feed_url, e);
                stats.failed_feeds += 1;
                continue;
            }
        };

        for item in items {
            let outcome = process_item(config, client, db, resolver, &item).await;
            stats.record(&outcome);

            match &outcome {
                ItemOutcome::Inserted { id, event } => {
                    if let Some(notifier) = notifier {
                        let text = notify::format_message(event);
                        if let Err(e) = notifier.send(&text).await {
                            // The stored event stays; alerting is best-effort.
                            warn!("Notify failed for event #{}: {}", id, e);
                            stats.notify_failures += 1;
                        }
                    }
                }
                ItemOutcome::Failed(reason) => {
                    warn!("Item failed: {} :: {}", item.link, reason);
                }
                ItemOutcome::Skipped(_) => {}
            }
        }
    }

    Ok(stats)
}

/// Filter, enrich, and persist a single feed item.
async fn process_item(
    config: &Config,
    client: &reqwest::Client,
    db: &Db,
    resolver: &Resolver,
    item: &FeedItem,
) -> ItemOutcome {
    let title = item.title.trim();
    let link = item.link.trim();
    let summary = item.summary.trim();

    if link.is_empty() {
        return ItemOutcome::Skipped(SkipReason::MissingLink);
    }

    match db.exists(link).await {
        Ok(true) => return ItemOutcome::Skipped(SkipReason::AlreadySeen),
        Ok(false) => {}
        Err(e) => return ItemOutcome::Failed(e.to_string()),
    }

    if !classify::is_candidate(title, summary) {
        return ItemOutcome::Skipped(SkipReason::NotCandidate);
    }

    let published_at = item
        .published
        .as_deref()
        .and_then(classify::normalize_date)
        .map(|date| date.to_string());

    // Full article text sharpens location extraction; a dead link
    // degrades to the title and summary alone.
    let article_text =
        match fetch::fetch_article_text(client, link, config.fetch.article_max_chars).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Article fetch failed: {} :: {}", link, e);
                String::new()
            }
        };

    let guess = classify::extract_location(title, summary, &article_text);

    let query = match (&guess.city, &guess.country) {
        (Some(city), Some(country)) => format!("{}, {}", city, country),
        (Some(city), None) => city.clone(),
        (None, Some(country)) => country.clone(),
        (None, None) => String::new(),
    };

    let coordinates = if query.is_empty() {
        None
    } else {
        match resolver.resolve(&query).await {
            Ok(coordinates) => coordinates,
            Err(e) => {
                warn!("Geocode failed: {} :: {}", query, e);
                None
            }
        }
    };

    let event = NewEvent {
        title: if title.is_empty() {
            "(no title)".to_string()
        } else {
            title.to_string()
        },
        source_url: link.to_string(),
        published_at,
        detected_at: Utc::now().to_rfc3339(),
        country: guess.country,
        region: guess.region,
        city: guess.city,
        latitude: coordinates.as_ref().map(|c| c.latitude),
        longitude: coordinates.as_ref().map(|c| c.longitude),
        raw_location_text: guess.raw_location_text,
    };

    let id = match db.insert_event(&event).await {
        Ok(id) => id,
        Err(Error::Duplicate(_)) => return ItemOutcome::Skipped(SkipReason::Duplicate),
        Err(e) => return ItemOutcome::Failed(e.to_string()),
    };

    info!("New event #{}: {}", id, event.source_url);
    ItemOutcome::Inserted { id, event }
}

/// Run scan cycles forever, sleeping the poll interval after each one
/// completes. Steady-state errors are logged and never terminate the
/// loop.
pub async fn run_worker(
    config: &Config,
    client: &reqwest::Client,
    db: &Db,
    resolver: &Resolver,
    notifier: Option<&Notifier>,
) -> Result<()> {
    let feed_urls = feeds::feed_urls(&config.feeds.query, &config.feeds.editions)?;
    let interval = Duration::from_secs(config.worker.poll_interval_secs);

    info!(
        "Worker started: {} feeds, polling every {}s",
        feed_urls.len(),
        config.worker.poll_interval_secs
    );

    loop {
        match run_once(config, client, db, resolver, notifier, &feed_urls).await {
            Ok(stats) => info!(
                "Scan complete: {} new, {} seen, {} filtered, {} failed",
                stats.new_events, stats.already_seen, stats.filtered_out, stats.failed_items
            ),
            Err(e) => warn!("Scan failed: {}", e),
        }

        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::create_client;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Harness {
        config: Config,
        client: reqwest::Client,
        db: Db,
        resolver: Resolver,
        _tmp: TempDir,
    }

    async fn setup(server: &MockServer) -> Harness {
        let tmp = TempDir::new().unwrap();
        let db = Db::new(&tmp.path().join("test.db")).await.unwrap();

        let mut config = Config::default();
        config.fetch.timeout_secs = 5;
        config.geocode.endpoint = format!("{}/search", server.uri());
        config.geocode.timeout_secs = 5;
        config.geocode.min_interval_ms = 0;
        config.telegram.api_base = server.uri();

        let client = create_client(&config.fetch).unwrap();
        let resolver = Resolver::new(&config.geocode, &config.fetch.user_agent, db.clone()).unwrap();

        Harness {
            config,
            client,
            db,
            resolver,
            _tmp: tmp,
        }
    }

    fn notifier_for(config: &Config) -> Notifier {
        Notifier::new(&config.telegram, "test-token".to_string(), "42".to_string()).unwrap()
    }

    fn farmhouse_feed(server: &MockServer) -> String {
        format!(
            r#"<rss><channel>
            <item>
                <title>Meteorite crashes into farmhouse in Ohio</title>
                <link>{}/articles/1</link>
                <pubDate>Tue, 04 Aug 2026 18:30:00 GMT</pubDate>
                <description></description>
            </item>
            </channel></rss>"#,
            server.uri()
        )
    }

    async fn mount_farmhouse(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/feed.rss"))
            .respond_with(ResponseTemplate::new(200).set_body_string(farmhouse_feed(server)))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/articles/1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<html><body><p>The rock came down near a farmhouse in Ohio. \
                 Officials across the United States confirmed the fall.</p></body></html>",
            ))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"lat": "40.4173", "lon": "-82.9071", "display_name": "Ohio, United States"}
            ])))
            .mount(server)
            .await;
    }

    fn feed_url(server: &MockServer) -> Url {
        Url::parse(&format!("{}/feed.rss", server.uri())).unwrap()
    }

    #[tokio::test]
    async fn test_scan_inserts_candidate_once() {
        let server = MockServer::start().await;
        mount_farmhouse(&server).await;

        Mock::given(method("POST"))
            .and(path("/bottest-token/sendMessage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let h = setup(&server).await;
        let notifier = notifier_for(&h.config);
        let urls = vec![feed_url(&server)];

        let stats = run_once(&h.config, &h.client, &h.db, &h.resolver, Some(&notifier), &urls)
            .await
            .unwrap();
        assert_eq!(stats.new_events, 1);
        assert_eq!(stats.notify_failures, 0);

        let events = h.db.list_events(10).await.unwrap();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.source_url, format!("{}/articles/1", server.uri()));
        assert_eq!(event.city.as_deref(), Some("Ohio"));
        assert_eq!(event.country.as_deref(), Some("United States"));
        assert_eq!(event.latitude, Some(40.4173));
        assert_eq!(event.published_at.as_deref(), Some("2026-08-04"));

        // Second run over the same feed: nothing new, one alert total.
        let stats = run_once(&h.config, &h.client, &h.db, &h.resolver, Some(&notifier), &urls)
            .await
            .unwrap();
        assert_eq!(stats.new_events, 0);
        assert_eq!(stats.already_seen, 1);
        assert_eq!(h.db.list_events(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_meteor_shower_is_filtered() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/feed.rss"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<rss><channel>
                <item>
                    <title>Meteor shower peaks this weekend</title>
                    <link>http://example.com/story-2</link>
                </item>
                </channel></rss>"#,
            ))
            .mount(&server)
            .await;

        let h = setup(&server).await;
        let urls = vec![feed_url(&server)];

        let stats = run_once(&h.config, &h.client, &h.db, &h.resolver, None, &urls)
            .await
            .unwrap();
        assert_eq!(stats.new_events, 0);
        assert_eq!(stats.filtered_out, 1);
        assert!(h.db.list_events(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_notify_failure_keeps_event() {
        let server = MockServer::start().await;
        mount_farmhouse(&server).await;

        Mock::given(method("POST"))
            .and(path("/bottest-token/sendMessage"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let h = setup(&server).await;
        let notifier = notifier_for(&h.config);
        let urls = vec![feed_url(&server)];

        let stats = run_once(&h.config, &h.client, &h.db, &h.resolver, Some(&notifier), &urls)
            .await
            .unwrap();
        assert_eq!(stats.new_events, 1);
        assert_eq!(stats.notify_failures, 1);
        assert_eq!(h.db.list_events(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failing_feed_does_not_abort_run() {
        let server = MockServer::start().await;
        mount_farmhouse(&server).await;

        Mock::given(method("GET"))
            .and(path("/broken.rss"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let h = setup(&server).await;
        let urls = vec![
            Url::parse(&format!("{}/broken.rss", server.uri())).unwrap(),
            feed_url(&server),
        ];

        let stats = run_once(&h.config, &h.client, &h.db, &h.resolver, None, &urls)
            .await
            .unwrap();
        assert_eq!(stats.failed_feeds, 1);
        assert_eq!(stats.new_events, 1);
    }

    #[tokio::test]
    async fn test_dead_article_and_geocode_degrade_gracefully() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/feed.rss"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"<rss><channel>
                <item>
                    <title>Meteorite fell in Norway</title>
                    <link>{}/articles/gone</link>
                </item>
                </channel></rss>"#,
                server.uri()
            )))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/articles/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let h = setup(&server).await;
        let urls = vec![feed_url(&server)];

        let stats = run_once(&h.config, &h.client, &h.db, &h.resolver, None, &urls)
            .await
            .unwrap();
        assert_eq!(stats.new_events, 1);

        // Location survives from the title; coordinates are absent.
        let event = &h.db.list_events(1).await.unwrap()[0];
        assert_eq!(event.country.as_deref(), Some("Norway"));
        assert_eq!(event.latitude, None);
        assert_eq!(event.longitude, None);
    }

    #[tokio::test]
    async fn test_item_without_link_is_skipped() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/feed.rss"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<rss><channel>
                <item><title>Meteorite fell somewhere</title></item>
                </channel></rss>"#,
            ))
            .mount(&server)
            .await;

        let h = setup(&server).await;
        let urls = vec![feed_url(&server)];

        let stats = run_once(&h.config, &h.client, &h.db, &h.resolver, None, &urls)
            .await
            .unwrap();
        assert_eq!(stats.new_events, 0);
        assert_eq!(stats.filtered_out, 1);
    }
}
