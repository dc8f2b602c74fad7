use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{DocumentId, SourceId};
use crate::domains::documents::models::DocumentListing;

/// Listing entry for `GET /documents`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentListData {
    pub id: DocumentId,
    pub source_title: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub content_text_preview: Option<String>,
    pub original_url: Option<String>,
    pub segment_count: i64,
}

impl From<DocumentListing> for DocumentListData {
    fn from(row: DocumentListing) -> Self {
        Self {
            id: row.id,
            source_title: row.source_title,
            title: row.title,
            author: row.author,
            published_at: row.published_at,
            created_at: row.created_at,
            content_text_preview: row.content_text_preview,
            original_url: row.original_url,
            segment_count: row.segment_count,
        }
    }
}

/// Body of `GET /documents/{id}/content`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentContentData {
    pub document_id: DocumentId,
    pub content_text: String,
    pub content_html: Option<String>,
}

/// Body of `PATCH /documents/{id}`; absent fields are left unchanged.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentMetadataPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub source_id: Option<SourceId>,
}

impl DocumentMetadataPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.published_at.is_none()
            && self.source_id.is_none()
    }
}
