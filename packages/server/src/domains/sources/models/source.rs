use anyhow::Result;
use chrono::{DateTime, Utc};
use providers::{FeedKind, FeedSpec};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::SourceId;

/// Source - a feed definition the ingestion worker pulls from.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Source {
    pub id: SourceId,
    pub name: String,
    pub source_type: String, // 'rss', 'podcast', 'manual'
    pub feed_url: Option<String>,
    pub is_active: bool,
    pub poll_frequency_hours: i32,
    pub last_polled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Source type enum.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Rss,
    Podcast,
    Manual,
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceType::Rss => write!(f, "rss"),
            SourceType::Podcast => write!(f, "podcast"),
            SourceType::Manual => write!(f, "manual"),
        }
    }
}

impl std::str::FromStr for SourceType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "rss" => Ok(SourceType::Rss),
            "podcast" => Ok(SourceType::Podcast),
            "manual" => Ok(SourceType::Manual),
            _ => Err(anyhow::anyhow!("Invalid source type: {}", s)),
        }
    }
}

impl Source {
    pub async fn find_by_id(id: SourceId, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>("SELECT * FROM sources WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_id_optional(id: SourceId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM sources WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn find_all(pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM sources ORDER BY created_at DESC")
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn update_last_polled(id: SourceId, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "UPDATE sources SET last_polled_at = NOW(), updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// The feed definition handed to an `Ingestor`.
    ///
    /// Fails when the source has no feed URL or an unknown type (manual
    /// sources are never enqueued for ingestion).
    pub fn to_feed_spec(&self) -> Result<FeedSpec> {
        let feed_url = self
            .feed_url
            .clone()
            .ok_or_else(|| anyhow::anyhow!("source {} has no feed_url", self.id))?;
        let kind: FeedKind = self
            .source_type
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))?;
        Ok(FeedSpec {
            name: self.name.clone(),
            kind,
            feed_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_source(source_type: &str, feed_url: Option<&str>) -> Source {
        Source {
            id: SourceId::new(),
            name: "Stratechery".into(),
            source_type: source_type.into(),
            feed_url: feed_url.map(str::to_string),
            is_active: true,
            poll_frequency_hours: 24,
            last_polled_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn feed_spec_requires_url() {
        let source = sample_source("rss", None);
        assert!(source.to_feed_spec().is_err());

        let source = sample_source("rss", Some("https://example.com/feed"));
        let spec = source.to_feed_spec().unwrap();
        assert_eq!(spec.kind, FeedKind::Rss);
        assert_eq!(spec.feed_url, "https://example.com/feed");
    }
}
