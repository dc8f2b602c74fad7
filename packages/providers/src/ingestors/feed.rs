//! RSS/podcast feed ingestor.
//!
//! Fetches the feed XML over HTTP and extracts items by string scanning.
//! Feed XML carries namespaces (`content:encoded`, `itunes:duration`) that
//! HTML parsers mangle, so plain tag scanning is the sturdier option here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::{ProviderError, Result};
use crate::traits::{AssetRecord, DocumentRecord, FeedKind, FeedSpec, Ingestor};

/// Pulls RSS and podcast feeds into document records.
pub struct FeedIngestor {
    client: reqwest::Client,
    user_agent: String,
}

impl Default for FeedIngestor {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedIngestor {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("reqwest client construction cannot fail with static config"),
            user_agent: "SignalNoiseIngest/1.0".to_string(),
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    fn parse_items(xml: &str, kind: FeedKind) -> Vec<DocumentRecord> {
        let mut records = Vec::new();

        for item in split_items(xml) {
            let title = tag_text(item, "title");
            let link = tag_text(item, "link");
            let guid = tag_text(item, "guid");
            let author = tag_text(item, "author").or_else(|| tag_text(item, "dc:creator"));
            let published_at = tag_text(item, "pubDate").and_then(|d| parse_feed_date(&d));
            let summary = tag_text(item, "description");
            let content_html = tag_text(item, "content:encoded").or_else(|| summary.clone());

            // The guid is the stable idempotency key; fall back to the link.
            let Some(external_id) = guid.clone().or_else(|| link.clone()) else {
                warn!("feed item without guid or link skipped");
                continue;
            };

            let (media_type, content_text, assets) = match kind {
                FeedKind::Podcast => {
                    let mut assets = Vec::new();
                    if let Some(enclosure_url) = enclosure_url(item) {
                        let mut asset = AssetRecord::audio(enclosure_url);
                        if let Some(duration) = tag_text(item, "itunes:duration")
                            .as_deref()
                            .and_then(parse_duration_seconds)
                        {
                            asset = asset.with_duration(duration);
                        }
                        assets.push(asset);
                    }
                    let text = summary.as_deref().map(html_to_text).filter(|t| !t.is_empty());
                    ("podcast_audio".to_string(), text, assets)
                }
                _ => {
                    let text = content_html
                        .as_deref()
                        .map(html_to_text)
                        .filter(|t| !t.is_empty());
                    ("article".to_string(), text, Vec::new())
                }
            };

            records.push(DocumentRecord {
                external_id,
                title,
                author,
                published_at,
                original_url: link,
                media_type,
                content_text,
                content_html,
                assets,
                provenance: serde_json::json!({ "ingest": "feed_pull" }),
            });
        }

        records
    }
}

#[async_trait]
impl Ingestor for FeedIngestor {
    async fn ingest(&self, feed: &FeedSpec) -> Result<Vec<DocumentRecord>> {
        info!(feed = %feed.name, url = %feed.feed_url, "fetching feed");

        let response = self
            .client
            .get(&feed.feed_url)
            .header("User-Agent", &self.user_agent)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(match status.as_u16() {
                429 => ProviderError::RateLimited(format!("HTTP 429 from {}", feed.feed_url)),
                400..=499 => {
                    ProviderError::BadRequest(format!("HTTP {status} from {}", feed.feed_url))
                }
                _ => ProviderError::Transient(format!("HTTP {status} from {}", feed.feed_url)),
            });
        }

        let xml = response.text().await?;
        let records = Self::parse_items(&xml, feed.kind);
        if records.is_empty() && !xml.contains("<item") {
            return Err(ProviderError::InvalidResponse(format!(
                "no feed items found at {}",
                feed.feed_url
            )));
        }

        debug!(feed = %feed.name, items = records.len(), "feed parsed");
        Ok(records)
    }

    fn name(&self) -> &str {
        "feed"
    }
}

/// Split the feed body into `<item>...</item>` chunks.
fn split_items(xml: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut rest = xml;
    while let Some(start) = rest.find("<item") {
        let after_start = &rest[start..];
        let Some(end) = after_start.find("</item>") else {
            break;
        };
        items.push(&after_start[..end]);
        rest = &after_start[end + "</item>".len()..];
    }
    items
}

/// Extract the text inside the first occurrence of `<tag>...</tag>`,
/// unwrapping CDATA sections.
fn tag_text(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");

    let start = xml.find(&open)?;
    let after_open = &xml[start + open.len()..];
    // Skip to the end of the opening tag (attributes allowed).
    let body_start = after_open.find('>')? + 1;
    let body = &after_open[body_start..];
    let end = body.find(&close)?;
    let mut value = body[..end].trim();

    if let Some(inner) = value.strip_prefix("<![CDATA[") {
        value = inner.strip_suffix("]]>").unwrap_or(inner).trim();
    }

    if value.is_empty() {
        None
    } else {
        Some(decode_entities(value))
    }
}

/// Extract the `url` attribute of the first `<enclosure>` element.
fn enclosure_url(xml: &str) -> Option<String> {
    let start = xml.find("<enclosure")?;
    let tag_end = xml[start..].find('>')? + start;
    let tag = &xml[start..tag_end];
    let url_attr = tag.find("url=")?;
    let quote = tag.as_bytes().get(url_attr + 4).copied()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let value_start = url_attr + 5;
    let value_end = tag[value_start..].find(quote as char)? + value_start;
    Some(decode_entities(&tag[value_start..value_end]))
}

fn decode_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

/// Reduce item HTML to plain text, one line per block.
fn html_to_text(html: &str) -> String {
    let br = regex::Regex::new(r"(?i)<br\s*/?>").unwrap();
    let blocks = regex::Regex::new(r"(?i)</(p|div|h1|h2|h3|li)>").unwrap();
    let tags = regex::Regex::new(r"<[^>]+>").unwrap();

    let text = br.replace_all(html, "\n");
    let text = blocks.replace_all(&text, "\n");
    let text = tags.replace_all(&text, "");

    decode_entities(&text)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// RFC 2822 date, the RSS standard format.
fn parse_feed_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value.trim())
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        })
}

/// Parse `HH:MM:SS`, `MM:SS`, or bare seconds.
fn parse_duration_seconds(value: &str) -> Option<f64> {
    let parts: Vec<&str> = value.trim().split(':').collect();
    let nums: Option<Vec<f64>> = parts.iter().map(|p| p.parse::<f64>().ok()).collect();
    let nums = nums?;
    match nums.as_slice() {
        [s] => Some(*s),
        [m, s] => Some(m * 60.0 + s),
        [h, m, s] => Some(h * 3600.0 + m * 60.0 + s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE_FEED: &str = r#"<?xml version="1.0"?>
        <rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/">
        <channel>
          <title>Stratechery</title>
          <item>
            <title>Aggregation Theory</title>
            <link>https://example.com/aggregation-theory</link>
            <guid>tag:example.com,2015:aggregation</guid>
            <author>Ben Thompson</author>
            <pubDate>Tue, 21 Jul 2015 14:00:00 +0000</pubDate>
            <content:encoded><![CDATA[<p>The value chain has <b>three</b> parts.</p>]]></content:encoded>
          </item>
          <item>
            <title>No Guid Item</title>
            <link>https://example.com/second</link>
            <description>Short summary.</description>
          </item>
        </channel>
        </rss>"#;

    const PODCAST_FEED: &str = r#"<?xml version="1.0"?>
        <rss version="2.0" xmlns:itunes="http://www.itunes.com/dtds/podcast-1.0.dtd">
        <channel>
          <item>
            <title>Episode 42</title>
            <link>https://example.com/ep42</link>
            <guid>ep-42</guid>
            <pubDate>Mon, 01 Jan 2024 10:00:00 +0000</pubDate>
            <description><![CDATA[We discuss <i>everything</i>.]]></description>
            <itunes:duration>1:02:30</itunes:duration>
            <enclosure url="https://cdn.example.com/ep42.mp3" length="1234" type="audio/mpeg"/>
          </item>
        </channel>
        </rss>"#;

    #[test]
    fn parses_article_items() {
        let records = FeedIngestor::parse_items(ARTICLE_FEED, FeedKind::Rss);
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.external_id, "tag:example.com,2015:aggregation");
        assert_eq!(first.title.as_deref(), Some("Aggregation Theory"));
        assert_eq!(first.author.as_deref(), Some("Ben Thompson"));
        assert_eq!(first.media_type, "article");
        assert!(first.published_at.is_some());
        assert_eq!(
            first.content_text.as_deref(),
            Some("The value chain has three parts.")
        );
        assert!(first.assets.is_empty());

        // Falls back to the link when no guid is present.
        assert_eq!(records[1].external_id, "https://example.com/second");
    }

    #[test]
    fn parses_podcast_enclosure_and_duration() {
        let records = FeedIngestor::parse_items(PODCAST_FEED, FeedKind::Podcast);
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.media_type, "podcast_audio");
        assert_eq!(record.assets.len(), 1);
        let asset = &record.assets[0];
        assert_eq!(asset.asset_type, "audio");
        assert_eq!(asset.url.as_deref(), Some("https://cdn.example.com/ep42.mp3"));
        assert_eq!(asset.duration_seconds, Some(3750.0));
        assert_eq!(record.content_text.as_deref(), Some("We discuss everything."));
    }

    #[test]
    fn duration_formats() {
        assert_eq!(parse_duration_seconds("90"), Some(90.0));
        assert_eq!(parse_duration_seconds("2:30"), Some(150.0));
        assert_eq!(parse_duration_seconds("1:00:05"), Some(3605.0));
        assert_eq!(parse_duration_seconds("bad"), None);
    }

    #[test]
    fn tag_text_handles_attributes_and_cdata() {
        let xml = r#"<guid isPermaLink="false"><![CDATA[abc-123]]></guid>"#;
        assert_eq!(tag_text(xml, "guid").as_deref(), Some("abc-123"));
    }
}
