//! Command implementations behind the CLI

use std::path::PathBuf;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::feeds;
use crate::fetch;
use crate::geocode::Resolver;
use crate::models::{Event, ScanStats};
use crate::notify::Notifier;
use crate::pipeline;
use crate::store::Db;
use tracing::info;

/// Write a starter config file and create the database.
pub async fn cmd_init(base_dir: Option<PathBuf>, force: bool) -> Result<()> {
    let config = Config::load_from(base_dir)?;

    if config.paths.config_file.exists() && !force {
        return Err(Error::Config(format!(
            "Config already exists at {} (use --force to overwrite)",
            config.paths.config_file.display()
        )));
    }

    config.save()?;
    Db::new(&config.paths.db_file).await?;
    info!("Initialized at {:?}", config.paths.base_dir);
    Ok(())
}

/// Build the components shared by scan and watch. Fails fast when the
/// notification credentials are missing: the worker must not run
/// without somewhere to send alerts.
async fn build_components(config: &Config) -> Result<(reqwest::Client, Db, Resolver, Notifier)> {
    let (bot_token, chat_id) = config.telegram_credentials()?;

    let client = fetch::create_client(&config.fetch)?;
    let db = Db::new(&config.paths.db_file).await?;
    let resolver = Resolver::new(&config.geocode, &config.fetch.user_agent, db.clone())?;
    let notifier = Notifier::new(&config.telegram, bot_token, chat_id)?;

    Ok((client, db, resolver, notifier))
}

/// Run a single scan cycle over all configured feeds.
pub async fn cmd_scan(config: &Config) -> Result<ScanStats> {
    let (client, db, resolver, notifier) = build_components(config).await?;
    let feed_urls = feeds::feed_urls(&config.feeds.query, &config.feeds.editions)?;

    pipeline::run_once(config, &client, &db, &resolver, Some(&notifier), &feed_urls).await
}

/// Run the repeating worker loop. Returns only on startup failure.
pub async fn cmd_watch(config: &Config) -> Result<()> {
    let (client, db, resolver, notifier) = build_components(config).await?;

    pipeline::run_worker(config, &client, &db, &resolver, Some(&notifier)).await
}

/// List stored events newest-first.
pub async fn cmd_events(config: &Config, limit: i64) -> Result<Vec<Event>> {
    let db = Db::new(&config.paths.db_file).await?;
    db.list_events(limit).await
}

/// Print a scan summary for humans.
pub fn print_scan_stats(stats: &ScanStats) {
    println!("✓ Scan complete");
    println!("  New events: {}", stats.new_events);
    println!("  Already seen: {}", stats.already_seen);
    println!("  Filtered out: {}", stats.filtered_out);
    if stats.duplicates > 0 {
        println!("  Duplicate races: {}", stats.duplicates);
    }
    if stats.failed_items > 0 {
        println!("  Failed items: {}", stats.failed_items);
    }
    if stats.notify_failures > 0 {
        println!("  Notify failures: {}", stats.notify_failures);
    }
    if stats.failed_feeds > 0 {
        println!("  Failed feeds: {}", stats.failed_feeds);
    }
}

/// Print events for humans.
pub fn print_events(events: &[Event]) {
    if events.is_empty() {
        println!("No events stored yet.");
        return;
    }

    for event in events {
        let location = [
            event.country.as_deref(),
            event.region.as_deref(),
            event.city.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(", ");

        let location = if location.is_empty() {
            event.raw_location_text.as_deref().unwrap_or("unknown")
        } else {
            location.as_str()
        };

        let date = event
            .published_at
            .as_deref()
            .unwrap_or(&event.detected_at);

        println!("#{} [{}] {} ({})", event.id, date, event.title, location);
        println!("    {}", event.source_url);
    }
}
