//! Topical filtering, location extraction, and date normalization
//!
//! Classification is a cheap keyword filter rather than a statistical
//! model: a false positive costs one geocode and one alert, while a
//! false negative is preferred over noise about meteor showers.

mod countries;

pub use countries::COUNTRY_NAMES;

use crate::models::LocationGuess;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

/// Impact wording that marks a report as a fall rather than a sighting.
const IMPACT_SIGNALS: &[&str] = &[
    "fell", "landed", "crash", "crashed", "impact", "hit", "struck", "smash",
];

/// Decide whether a fetched item looks like a meteorite-fall report.
///
/// Case-insensitive over title and summary. "meteorite" alone is
/// enough; "meteor" additionally needs an impact signal word, and
/// "meteor shower" / "meteorological" reject the item outright.
pub fn is_candidate(title: &str, summary: &str) -> bool {
    let text = format!("{} {}", title, summary).to_lowercase();

    if !text.contains("meteorite") && !text.contains("meteor") {
        return false;
    }

    if text.contains("meteor shower") || text.contains("meteorological") {
        return false;
    }

    IMPACT_SIGNALS.iter().any(|s| text.contains(s)) || text.contains("meteorite")
}

/// Capitalized phrase following a place preposition, e.g. "in Ohio",
/// "near Lake Huron", "over central France".
fn place_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:in|near|over|outside|above|across)\s+([A-Z][A-Za-z'-]*(?:\s+[A-Z][A-Za-z'-]*){0,2})")
            .ok()
    })
    .as_ref()
}

/// Extract a city/country guess from the concatenated article text.
///
/// Place mentions come from the preposition scan; a mention that
/// exactly matches a canonical country name counts as the country,
/// anything else as the city. When the scan finds no country, an
/// independent substring pass over [`COUNTRY_NAMES`] supplies one
/// (first name in list order wins).
pub fn extract_location(title: &str, summary: &str, article_text: &str) -> LocationGuess {
    let blob = format!("{} {} {}", title, summary, article_text);
    let blob_lower = blob.to_lowercase();

    let mut city: Option<String> = None;
    let mut country: Option<String> = None;

    if let Some(re) = place_regex() {
        for cap in re.captures_iter(&blob) {
            let place = cap[1].to_string();
            if let Some(name) = canonical_country(&place) {
                if country.is_none() {
                    country = Some(name.to_string());
                }
            } else if city.is_none() {
                city = Some(place);
            }
            if city.is_some() && country.is_some() {
                break;
            }
        }
    }

    if country.is_none() {
        country = COUNTRY_NAMES
            .iter()
            .find(|name| blob_lower.contains(&name.to_lowercase()))
            .map(|name| (*name).to_string());
    }

    let raw_location_text = match (&city, &country) {
        (Some(c), Some(n)) => Some(format!("{}, {}", c, n)),
        (Some(c), None) => Some(c.clone()),
        (None, Some(n)) => Some(n.clone()),
        (None, None) => None,
    };

    LocationGuess {
        city,
        region: None,
        country,
        raw_location_text,
    }
}

/// Exact (case-insensitive) country-name lookup.
fn canonical_country(place: &str) -> Option<&'static str> {
    let lower = place.to_lowercase();
    COUNTRY_NAMES
        .iter()
        .find(|name| name.to_lowercase() == lower)
        .copied()
}

/// Best-effort parse of a free-text publication date.
///
/// RSS pubDate is usually RFC 2822; fall back to RFC 3339 and a few
/// common formats. Unparseable input yields None.
pub fn normalize_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = chrono::DateTime::parse_from_rfc2822(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }

    const FORMATS: &[&str] = &["%Y-%m-%d", "%d %b %Y", "%d %B %Y", "%b %d, %Y", "%B %d, %Y"];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}
