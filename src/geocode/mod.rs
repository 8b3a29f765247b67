//! Cache-fronted place resolution
//!
//! Resolution order: length guard, durable cache, then one external
//! Nominatim-style call spaced by the resolver-owned limiter. Only
//! successful resolutions are cached, so an unresolvable query is
//! retried on a later run.

mod rate_limit;

pub use rate_limit::MinIntervalLimiter;

use std::time::Duration;

use crate::config::GeocodeConfig;
use crate::error::{Error, Result};
use crate::models::Coordinates;
use crate::store::Db;
use serde::Deserialize;
use tracing::debug;

/// One candidate returned by the geocoding service. Nominatim sends
/// coordinates as strings.
#[derive(Debug, Deserialize)]
struct GeocodeCandidate {
    lat: String,
    lon: String,
    display_name: Option<String>,
}

/// Cache-fronted geocoding client.
pub struct Resolver {
    client: reqwest::Client,
    db: Db,
    endpoint: String,
    limiter: MinIntervalLimiter,
}

impl Resolver {
    pub fn new(config: &GeocodeConfig, user_agent: &str, db: Db) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            db,
            endpoint: config.endpoint.clone(),
            limiter: MinIntervalLimiter::new(Duration::from_millis(config.min_interval_ms)),
        })
    }

    /// Resolve a free-text place description to coordinates.
    ///
    /// Queries shorter than three characters after trimming are never
    /// resolved. A cache hit returns without touching the network or
    /// the rate limiter. Callers should expect a cache miss to block
    /// for at least the configured interval.
    pub async fn resolve(&self, query: &str) -> Result<Option<Coordinates>> {
        let query = query.trim();
        if query.chars().count() < 3 {
            return Ok(None);
        }

        if let Some(entry) = self.db.cached_geocode(query).await? {
            debug!("Geocode cache hit: {}", query);
            return Ok(match (entry.latitude, entry.longitude) {
                (Some(latitude), Some(longitude)) => Some(Coordinates {
                    latitude,
                    longitude,
                    display_name: entry.display_name,
                }),
                _ => None,
            });
        }

        self.limiter.wait().await;

        debug!("Geocoding: {}", query);
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Geocode(format!("HTTP {} for query: {}", status, query)));
        }

        let candidates: Vec<GeocodeCandidate> = response.json().await?;
        let Some(first) = candidates.into_iter().next() else {
            // Not cached: the place may resolve on a later run.
            debug!("No geocode result for: {}", query);
            return Ok(None);
        };

        let latitude: f64 = first
            .lat
            .parse()
            .map_err(|_| Error::Geocode(format!("Bad latitude in response: {}", first.lat)))?;
        let longitude: f64 = first
            .lon
            .parse()
            .map_err(|_| Error::Geocode(format!("Bad longitude in response: {}", first.lon)))?;

        self.db
            .cache_geocode(query, latitude, longitude, first.display_name.as_deref())
            .await?;

        Ok(Some(Coordinates {
            latitude,
            longitude,
            display_name: first.display_name,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup(server: &MockServer) -> (Resolver, TempDir) {
        let tmp = TempDir::new().unwrap();
        let db = Db::new(&tmp.path().join("test.db")).await.unwrap();

        let config = GeocodeConfig {
            endpoint: format!("{}/search", server.uri()),
            timeout_secs: 5,
            min_interval_ms: 0,
        };
        let resolver = Resolver::new(&config, "skyfall-test", db).unwrap();
        (resolver, tmp)
    }

    #[tokio::test]
    async fn test_short_queries_never_resolve() {
        let server = MockServer::start().await;

        // Any request at all would violate the length-guard contract.
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let (resolver, _tmp) = setup(&server).await;
        assert_eq!(resolver.resolve("").await.unwrap(), None);
        assert_eq!(resolver.resolve("ab").await.unwrap(), None);
        assert_eq!(resolver.resolve("  a  ").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_second_resolve_hits_cache() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "Columbus, United States"))
            .and(query_param("format", "json"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"lat": "39.9612", "lon": "-82.9988", "display_name": "Columbus, Ohio, USA"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let (resolver, _tmp) = setup(&server).await;

        let first = resolver.resolve("Columbus, United States").await.unwrap().unwrap();
        assert_eq!(first.latitude, 39.9612);
        assert_eq!(first.display_name.as_deref(), Some("Columbus, Ohio, USA"));

        // Identical query string: served from the cache, zero new calls.
        let second = resolver.resolve("Columbus, United States").await.unwrap().unwrap();
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn test_no_result_is_not_cached() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(2)
            .mount(&server)
            .await;

        let (resolver, _tmp) = setup(&server).await;

        // Both calls go out; a miss leaves nothing behind to hit.
        assert_eq!(resolver.resolve("Nowhereville").await.unwrap(), None);
        assert_eq!(resolver.resolve("Nowhereville").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_http_error_surfaces() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (resolver, _tmp) = setup(&server).await;
        assert!(resolver.resolve("Columbus, United States").await.is_err());
    }
}
