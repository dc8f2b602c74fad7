use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{DocumentId, SegmentId};
use crate::domains::documents::data::DocumentContentData;
use crate::domains::segments::models::{Segment, SegmentListing};

/// Body of `POST /segments`.
#[derive(Debug, Clone, Deserialize)]
pub struct SegmentCreateRequest {
    pub document_id: DocumentId,
    pub text: String,
    pub start_offset: Option<i32>,
    pub end_offset: Option<i32>,
    pub html: Option<String>,
}

/// Listing entry for `GET /segments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentListData {
    pub id: SegmentId,
    pub document_id: DocumentId,
    pub title: Option<String>,
    pub author: Option<String>,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    pub hypothesis_count: i64,
}

impl From<SegmentListing> for SegmentListData {
    fn from(row: SegmentListing) -> Self {
        Self {
            id: row.id,
            document_id: row.document_id,
            title: row.title,
            author: row.author,
            text: row.text,
            created_at: row.created_at,
            published_at: row.published_at,
            hypothesis_count: row.hypothesis_count,
        }
    }
}

/// Segment detail used by the workbench view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentDetailData {
    pub id: SegmentId,
    pub document_id: DocumentId,
    pub text: String,
    pub content_html: Option<String>,
    pub segment_status: String,
    pub version: i32,
    pub created_at: DateTime<Utc>,
}

impl From<Segment> for SegmentDetailData {
    fn from(segment: Segment) -> Self {
        Self {
            id: segment.id,
            document_id: segment.document_id,
            text: segment.text,
            content_html: segment.content_html,
            segment_status: segment.segment_status,
            version: segment.version,
            created_at: segment.created_at,
        }
    }
}

/// Body of `GET /segments/{id}`: the segment plus its parent document's
/// content, which the workbench renders side by side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentWorkbenchData {
    pub segment: SegmentDetailData,
    pub document: DocumentContentData,
}
