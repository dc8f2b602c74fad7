use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::common::{DocumentId, SegmentId};

/// Segment - an atomic excerpt of a document.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Segment {
    pub id: SegmentId,
    pub document_id: DocumentId,
    pub text: String,
    pub content_html: Option<String>,
    pub start_offset: Option<i32>,
    pub end_offset: Option<i32>,
    pub offset_kind: String,    // 'text', 'html', 'seconds'
    pub segment_status: String, // 'raw', 'final', 'superseded'
    pub version: i32,
    pub labels: Json<serde_json::Value>,
    pub provenance: Json<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OffsetKind {
    Text,
    Html,
    Seconds,
}

impl std::fmt::Display for OffsetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OffsetKind::Text => write!(f, "text"),
            OffsetKind::Html => write!(f, "html"),
            OffsetKind::Seconds => write!(f, "seconds"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SegmentStatus {
    Raw,
    Final,
    Superseded,
}

impl std::fmt::Display for SegmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SegmentStatus::Raw => write!(f, "raw"),
            SegmentStatus::Final => write!(f, "final"),
            SegmentStatus::Superseded => write!(f, "superseded"),
        }
    }
}

/// Offset validation failure; mapped to a 400 at the API layer.
#[derive(Debug, thiserror::Error)]
pub enum OffsetError {
    #[error("start_offset must be less than end_offset")]
    Inverted,
    #[error("offsets must be non-negative")]
    Negative,
    #[error("offsets exceed document text length {len}")]
    OutOfBounds { len: usize },
    #[error("segment text cannot be empty")]
    EmptyText,
}

/// Fields for a new segment; offsets are validated before insert.
#[derive(Debug, Clone)]
pub struct NewSegment {
    pub document_id: DocumentId,
    pub text: String,
    pub content_html: Option<String>,
    pub start_offset: Option<i32>,
    pub end_offset: Option<i32>,
    pub offset_kind: OffsetKind,
    pub provenance: serde_json::Value,
}

impl NewSegment {
    /// Check the offset invariant: when both offsets are present they must
    /// satisfy `0 <= start < end`, and for text offsets `end` must be inside
    /// the document text.
    pub fn validate(&self, document_text_len: Option<usize>) -> std::result::Result<(), OffsetError> {
        if self.text.trim().is_empty() {
            return Err(OffsetError::EmptyText);
        }
        let (Some(start), Some(end)) = (self.start_offset, self.end_offset) else {
            return Ok(());
        };
        if start < 0 || end < 0 {
            return Err(OffsetError::Negative);
        }
        if start >= end {
            return Err(OffsetError::Inverted);
        }
        if self.offset_kind == OffsetKind::Text {
            if let Some(len) = document_text_len {
                if end as usize > len {
                    return Err(OffsetError::OutOfBounds { len });
                }
            }
        }
        Ok(())
    }
}

/// Listing row: segment plus document metadata and linked-hypothesis count.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SegmentListing {
    pub id: SegmentId,
    pub document_id: DocumentId,
    pub title: Option<String>,
    pub author: Option<String>,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    pub hypothesis_count: i64,
}

impl Segment {
    pub async fn find_by_id(id: SegmentId, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>("SELECT * FROM segments WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_id_optional(id: SegmentId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM segments WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Insert a validated segment; new segments start at `raw` / version 1.
    pub async fn create(new: &NewSegment, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO segments (
                document_id, text, content_html, start_offset, end_offset,
                offset_kind, segment_status, provenance
            )
            VALUES ($1, $2, $3, $4, $5, $6, 'raw', $7)
            RETURNING *
            "#,
        )
        .bind(new.document_id)
        .bind(&new.text)
        .bind(&new.content_html)
        .bind(new.start_offset)
        .bind(new.end_offset)
        .bind(new.offset_kind.to_string())
        .bind(Json(&new.provenance))
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// All segments with document metadata and linked-hypothesis counts.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<SegmentListing>> {
        sqlx::query_as::<_, SegmentListing>(
            r#"
            SELECT
                s.id,
                s.document_id,
                d.title,
                d.author,
                s.text,
                s.created_at,
                d.published_at,
                COALESCE(link_counts.hypothesis_count, 0) AS hypothesis_count
            FROM segments s
            JOIN documents d ON s.document_id = d.id
            LEFT JOIN (
                SELECT segment_id, COUNT(DISTINCT hypothesis_id) AS hypothesis_count
                FROM hypothesis_segment_links
                GROUP BY segment_id
            ) link_counts ON s.id = link_counts.segment_id
            ORDER BY s.created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn list_for_document(document_id: DocumentId, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM segments WHERE document_id = $1 ORDER BY created_at DESC",
        )
        .bind(document_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn delete(id: SegmentId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("DELETE FROM segments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_segment(start: Option<i32>, end: Option<i32>, kind: OffsetKind) -> NewSegment {
        NewSegment {
            document_id: DocumentId::new(),
            text: "DEF".into(),
            content_html: None,
            start_offset: start,
            end_offset: end,
            offset_kind: kind,
            provenance: serde_json::json!({"source": "manual"}),
        }
    }

    #[test]
    fn offsets_within_document_pass() {
        // content_text = "ABCDEFGHIJ" (len 10), selecting "DEF"
        let segment = new_segment(Some(3), Some(6), OffsetKind::Text);
        assert!(segment.validate(Some(10)).is_ok());
    }

    #[test]
    fn inverted_offsets_rejected() {
        let segment = new_segment(Some(6), Some(3), OffsetKind::Text);
        assert!(matches!(
            segment.validate(Some(10)),
            Err(OffsetError::Inverted)
        ));
        let equal = new_segment(Some(3), Some(3), OffsetKind::Text);
        assert!(matches!(equal.validate(Some(10)), Err(OffsetError::Inverted)));
    }

    #[test]
    fn out_of_bounds_text_offsets_rejected() {
        let segment = new_segment(Some(3), Some(11), OffsetKind::Text);
        assert!(matches!(
            segment.validate(Some(10)),
            Err(OffsetError::OutOfBounds { len: 10 })
        ));
    }

    #[test]
    fn seconds_offsets_skip_length_check() {
        let segment = new_segment(Some(0), Some(4000), OffsetKind::Seconds);
        assert!(segment.validate(Some(10)).is_ok());
    }

    #[test]
    fn missing_offsets_are_allowed() {
        let segment = new_segment(None, None, OffsetKind::Text);
        assert!(segment.validate(Some(10)).is_ok());
    }

    #[test]
    fn empty_text_rejected() {
        let mut segment = new_segment(None, None, OffsetKind::Text);
        segment.text = "   ".into();
        assert!(matches!(
            segment.validate(Some(10)),
            Err(OffsetError::EmptyText)
        ));
    }
}
