use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::SourceId;
use crate::domains::sources::models::Source;

/// API representation of a source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceData {
    pub id: SourceId,
    pub name: String,
    #[serde(rename = "type")]
    pub source_type: String,
    pub url: Option<String>,
    pub is_active: bool,
    pub last_polled: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Source> for SourceData {
    fn from(source: Source) -> Self {
        Self {
            id: source.id,
            name: source.name,
            source_type: source.source_type,
            url: source.feed_url,
            is_active: source.is_active,
            last_polled: source.last_polled_at,
            created_at: source.created_at,
        }
    }
}
