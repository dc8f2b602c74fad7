use anyhow::Result;
use chrono::{DateTime, Utc};
use providers::{AssetRecord, DocumentRecord};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::common::{DocumentId, SourceId};

/// Document - an ingested artifact (article or podcast episode).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Document {
    pub id: DocumentId,
    pub source_id: Option<SourceId>,
    pub external_id: String,
    pub ingest_method: String,
    pub original_media_type: String,
    pub original_url: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub ingested_at: DateTime<Utc>,
    pub content_text: Option<String>,
    pub content_html: Option<String>,
    pub assets: Json<Vec<AssetRecord>>,
    pub provenance: Json<serde_json::Value>,
    pub transcript_status: String, // 'none', 'pending', 'partial', 'complete'
    pub ingest_status: String,     // 'pending', 'ok', 'failed'
    pub ingest_error: Option<String>,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptStatus {
    None,
    Pending,
    Partial,
    Complete,
}

impl std::fmt::Display for TranscriptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranscriptStatus::None => write!(f, "none"),
            TranscriptStatus::Pending => write!(f, "pending"),
            TranscriptStatus::Partial => write!(f, "partial"),
            TranscriptStatus::Complete => write!(f, "complete"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IngestStatus {
    Pending,
    Ok,
    Failed,
}

impl std::fmt::Display for IngestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestStatus::Pending => write!(f, "pending"),
            IngestStatus::Ok => write!(f, "ok"),
            IngestStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Listing row: document plus source name and segment count.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DocumentListing {
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

impl Document {
    pub async fn find_by_id(id: DocumentId, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>("SELECT * FROM documents WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_id_optional(id: DocumentId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM documents WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Non-archived documents, newest first, with previews and segment counts.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<DocumentListing>> {
        sqlx::query_as::<_, DocumentListing>(
            r#"
            SELECT
                d.id,
                s.name AS source_title,
                d.title,
                d.author,
                d.published_at,
                d.created_at,
                LEFT(d.content_text, 300) AS content_text_preview,
                d.original_url,
                COALESCE(seg_counts.segment_count, 0) AS segment_count
            FROM documents d
            LEFT JOIN sources s ON d.source_id = s.id
            LEFT JOIN (
                SELECT document_id, COUNT(*) AS segment_count
                FROM segments
                GROUP BY document_id
            ) seg_counts ON d.id = seg_counts.document_id
            WHERE d.is_archived = FALSE
            ORDER BY d.published_at DESC NULLS LAST, d.created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Listing row for a single document (the PATCH response shape).
    pub async fn listing_by_id(id: DocumentId, pool: &PgPool) -> Result<Option<DocumentListing>> {
        sqlx::query_as::<_, DocumentListing>(
            r#"
            SELECT
                d.id,
                s.name AS source_title,
                d.title,
                d.author,
                d.published_at,
                d.created_at,
                LEFT(d.content_text, 300) AS content_text_preview,
                d.original_url,
                COALESCE(seg_counts.segment_count, 0) AS segment_count
            FROM documents d
            LEFT JOIN sources s ON d.source_id = s.id
            LEFT JOIN (
                SELECT document_id, COUNT(*) AS segment_count
                FROM segments
                GROUP BY document_id
            ) seg_counts ON d.id = seg_counts.document_id
            WHERE d.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Soft delete: hide from listings, keep the row and its segments.
    pub async fn archive(id: DocumentId, pool: &PgPool) -> Result<bool> {
        let result =
            sqlx::query("UPDATE documents SET is_archived = TRUE, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Partial metadata update; absent fields are left untouched.
    pub async fn update_metadata(
        id: DocumentId,
        title: Option<&str>,
        author: Option<&str>,
        published_at: Option<DateTime<Utc>>,
        source_id: Option<SourceId>,
        pool: &PgPool,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET title = COALESCE($2, title),
                author = COALESCE($3, author),
                published_at = COALESCE($4, published_at),
                source_id = COALESCE($5, source_id),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(author)
        .bind(published_at)
        .bind(source_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Upsert a feed record by `(source_id, external_id)`.
    ///
    /// Re-ingesting refreshes metadata and content, clears any prior ingest
    /// error, and bumps `updated_at`. Podcast records start with
    /// `transcript_status = 'pending'`.
    pub async fn upsert_from_record(
        source_id: SourceId,
        record: &DocumentRecord,
        pool: &PgPool,
    ) -> Result<Self> {
        let transcript_status = if record.assets.iter().any(|a| a.asset_type == "audio") {
            "pending"
        } else {
            "none"
        };

        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO documents (
                source_id, external_id, ingest_method, original_media_type,
                original_url, title, author, published_at, ingested_at,
                content_html, content_text, assets, provenance,
                ingest_status, transcript_status
            )
            VALUES ($1, $2, 'feed_pull', $3, $4, $5, $6, $7, NOW(), $8, $9, $10, $11, 'ok', $12)
            ON CONFLICT (source_id, external_id)
            DO UPDATE SET
                original_url = EXCLUDED.original_url,
                title = EXCLUDED.title,
                author = EXCLUDED.author,
                published_at = EXCLUDED.published_at,
                content_html = EXCLUDED.content_html,
                content_text = EXCLUDED.content_text,
                assets = EXCLUDED.assets,
                provenance = EXCLUDED.provenance,
                ingest_status = 'ok',
                ingest_error = NULL,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(source_id)
        .bind(&record.external_id)
        .bind(&record.media_type)
        .bind(&record.original_url)
        .bind(&record.title)
        .bind(&record.author)
        .bind(record.published_at)
        .bind(&record.content_html)
        .bind(&record.content_text)
        .bind(Json(&record.assets))
        .bind(Json(&record.provenance))
        .bind(transcript_status)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// One-off ingestion of a URL with no backing source.
    pub async fn insert_direct(
        url: &str,
        title: &str,
        author: Option<&str>,
        published_at: Option<DateTime<Utc>>,
        content_html: &str,
        content_text: &str,
        pool: &PgPool,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO documents (
                source_id, external_id, ingest_method, original_media_type,
                original_url, title, author, published_at, ingested_at,
                content_html, content_text, ingest_status
            )
            VALUES (NULL, $1, 'direct_url', 'article', $1, $2, $3, $4, NOW(), $5, $6, 'ok')
            RETURNING *
            "#,
        )
        .bind(url)
        .bind(title)
        .bind(author)
        .bind(published_at)
        .bind(content_html)
        .bind(content_text)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Append a transcript asset; full-length runs also replace the
    /// document text. Prior assets are never removed.
    pub async fn append_transcript(
        id: DocumentId,
        asset: &AssetRecord,
        full_text: Option<&str>,
        pool: &PgPool,
    ) -> Result<Self> {
        let transcript_status = if full_text.is_some() {
            TranscriptStatus::Complete
        } else {
            TranscriptStatus::Partial
        };

        sqlx::query_as::<_, Self>(
            r#"
            UPDATE documents
            SET assets = assets || $2::jsonb,
                content_text = COALESCE($3, content_text),
                transcript_status = $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(Json(vec![asset]))
        .bind(full_text)
        .bind(transcript_status.to_string())
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// The first audio asset URL, if any.
    pub fn audio_url(&self) -> Option<&str> {
        self.assets
            .iter()
            .find(|a| a.asset_type == "audio")
            .and_then(|a| a.url.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document(assets: Vec<AssetRecord>) -> Document {
        Document {
            id: DocumentId::new(),
            source_id: None,
            external_id: "ext".into(),
            ingest_method: "feed_pull".into(),
            original_media_type: "podcast_audio".into(),
            original_url: None,
            title: None,
            author: None,
            published_at: None,
            ingested_at: Utc::now(),
            content_text: None,
            content_html: None,
            assets: Json(assets),
            provenance: Json(serde_json::json!({})),
            transcript_status: "pending".into(),
            ingest_status: "ok".into(),
            ingest_error: None,
            is_archived: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn audio_url_finds_first_audio_asset() {
        let doc = sample_document(vec![
            AssetRecord {
                asset_type: "transcript".into(),
                url: None,
                duration_seconds: None,
                start_seconds: None,
                end_seconds: None,
                text: Some("words".into()),
                provider: Some("openai".into()),
            },
            AssetRecord::audio("https://cdn.example.com/ep.mp3"),
        ]);
        assert_eq!(doc.audio_url(), Some("https://cdn.example.com/ep.mp3"));

        let doc = sample_document(vec![]);
        assert_eq!(doc.audio_url(), None);
    }
}
