//! Search feed construction and RSS parsing
//!
//! Builds one Google News search feed per regional edition and parses
//! the returned RSS with simple tag scanning. Feeds that deviate from
//! the usual `<item>` layout just yield fewer items.

use crate::error::Result;
use crate::models::FeedItem;
use url::Url;

const GOOGLE_NEWS_RSS: &str = "https://news.google.com/rss/search";

/// Build the search feed URL for one regional edition.
pub fn search_feed_url(query: &str, hl: &str, gl: &str, ceid: &str) -> Result<Url> {
    let mut url = Url::parse(GOOGLE_NEWS_RSS)?;
    url.query_pairs_mut()
        .append_pair("q", query)
        .append_pair("hl", hl)
        .append_pair("gl", gl)
        .append_pair("ceid", ceid);
    Ok(url)
}

/// One feed URL per configured edition ("US", "GB", ...).
pub fn feed_urls(query: &str, editions: &[String]) -> Result<Vec<Url>> {
    editions
        .iter()
        .map(|gl| search_feed_url(query, "en", gl, &format!("{}:en", gl)))
        .collect()
}

/// Parse RSS content into feed items.
pub fn parse_feed(content: &str) -> Vec<FeedItem> {
    let mut items = Vec::new();

    for block in content.split("<item>").skip(1) {
        let Some(end) = block.find("</item>") else {
            continue;
        };
        let block = &block[..end];

        items.push(FeedItem {
            title: extract_tag(block, "title").unwrap_or_default(),
            link: extract_tag(block, "link").unwrap_or_default(),
            published: extract_tag(block, "pubDate"),
            summary: extract_tag(block, "description").unwrap_or_default(),
        });
    }

    items
}

/// Extract text content from an XML tag, unwrapping CDATA and the
/// handful of entities that show up in feed titles.
fn extract_tag(content: &str, tag: &str) -> Option<String> {
    let start_tag = format!("<{}>", tag);
    let end_tag = format!("</{}>", tag);

    content.find(&start_tag).and_then(|start| {
        let value_start = start + start_tag.len();
        content[value_start..].find(&end_tag).map(|end| {
            let value = content[value_start..value_start + end].trim();
            decode_entities(unwrap_cdata(value))
        })
    })
}

fn unwrap_cdata(value: &str) -> &str {
    value
        .strip_prefix("<![CDATA[")
        .and_then(|v| v.strip_suffix("]]>"))
        .map(str::trim)
        .unwrap_or(value)
}

fn decode_entities(value: &str) -> String {
    value
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_feed_url() {
        let url = search_feed_url("meteorite fell", "en", "US", "US:en").unwrap();
        let s = url.as_str();
        assert!(s.starts_with("https://news.google.com/rss/search?"));
        assert!(s.contains("q=meteorite+fell"));
        assert!(s.contains("gl=US"));
        assert!(s.contains("ceid=US%3Aen"));
    }

    #[test]
    fn test_feed_urls_one_per_edition() {
        let editions = vec!["US".to_string(), "GB".to_string(), "AU".to_string()];
        let urls = feed_urls("meteorite", &editions).unwrap();
        assert_eq!(urls.len(), 3);
        assert!(urls[1].as_str().contains("gl=GB"));
        assert!(urls[1].as_str().contains("ceid=GB%3Aen"));
    }

    #[test]
    fn test_parse_feed() {
        let rss = r#"<?xml version="1.0" encoding="UTF-8"?>
        <rss version="2.0">
        <channel>
            <title>Search results</title>
            <item>
                <title><![CDATA[Meteorite crashes into farmhouse]]></title>
                <link>http://example.com/story-1</link>
                <pubDate>Tue, 04 Aug 2026 18:30:00 GMT</pubDate>
                <description>A rock fell from the sky &amp; hit a barn.</description>
            </item>
            <item>
                <title>Meteor shower peaks this weekend</title>
                <link>http://example.com/story-2</link>
            </item>
        </channel>
        </rss>"#;

        let items = parse_feed(rss);
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].title, "Meteorite crashes into farmhouse");
        assert_eq!(items[0].link, "http://example.com/story-1");
        assert_eq!(items[0].published.as_deref(), Some("Tue, 04 Aug 2026 18:30:00 GMT"));
        assert_eq!(items[0].summary, "A rock fell from the sky & hit a barn.");

        assert_eq!(items[1].title, "Meteor shower peaks this weekend");
        assert_eq!(items[1].published, None);
        assert_eq!(items[1].summary, "");
    }

    #[test]
    fn test_parse_feed_without_items() {
        assert!(parse_feed("").is_empty());
        assert!(parse_feed("<rss><channel><title>empty</title></channel></rss>").is_empty());
    }
}
