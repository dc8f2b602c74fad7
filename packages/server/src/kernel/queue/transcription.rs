//! Transcription request queue.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::common::{DocumentId, TranscriptionJobId};

/// TranscriptionRequest - one queued transcription of a document's audio,
/// optionally windowed.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TranscriptionRequest {
    pub id: TranscriptionJobId,
    pub document_id: DocumentId,
    pub provider: String, // 'openai', 'assembly'
    pub model: Option<String>,
    pub start_seconds: Option<f64>,
    pub end_seconds: Option<f64>,
    pub status: String, // 'pending', 'in_progress', 'completed', 'failed'
    pub result_text: Option<String>,
    pub metadata: Json<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new transcription request.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTranscriptionRequest {
    pub document_id: DocumentId,
    #[serde(default = "default_provider")]
    pub provider: String,
    pub model: Option<String>,
    pub start_seconds: Option<f64>,
    pub end_seconds: Option<f64>,
}

fn default_provider() -> String {
    "openai".to_string()
}

impl TranscriptionRequest {
    pub async fn enqueue(new: &NewTranscriptionRequest, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO transcription_requests
                (document_id, provider, model, start_seconds, end_seconds)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(new.document_id)
        .bind(&new.provider)
        .bind(&new.model)
        .bind(new.start_seconds)
        .bind(new.end_seconds)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Atomically claim the oldest pending request.
    pub async fn claim_next(pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE transcription_requests
            SET status = 'in_progress', updated_at = NOW()
            WHERE id = (
                SELECT id
                FROM transcription_requests
                WHERE status = 'pending'
                ORDER BY created_at
                FOR UPDATE SKIP LOCKED
                LIMIT 1
            )
            RETURNING *
            "#,
        )
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Record the transcript and mark completed, clearing any prior error.
    pub async fn complete(id: TranscriptionJobId, result_text: &str, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE transcription_requests
            SET status = 'completed',
                result_text = $2,
                metadata = metadata - 'error',
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(result_text)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Record the failure summary in metadata; the audio URL stays on the
    /// document so an operator-triggered retry can pick it up.
    pub async fn fail(id: TranscriptionJobId, error: &str, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE transcription_requests
            SET status = 'failed',
                result_text = NULL,
                metadata = metadata || jsonb_build_object('error', $2::text),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(error)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Merge provider metadata into the request row.
    pub async fn merge_metadata(
        id: TranscriptionJobId,
        metadata: &serde_json::Value,
        pool: &PgPool,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE transcription_requests
            SET metadata = metadata || $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(Json(metadata))
        .execute(pool)
        .await?;
        Ok(())
    }
}
