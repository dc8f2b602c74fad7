//! Ingestion request queue.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::debug;

use super::EnqueueResult;
use crate::common::{IngestionJobId, SourceId};

/// IngestionRequest - one queued pull of a source's feed.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct IngestionRequest {
    pub id: IngestionJobId,
    pub source_id: SourceId,
    pub status: String, // 'queued', 'in_progress', 'completed', 'failed'
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IngestionRequest {
    /// Enqueue an ingestion job for a source.
    ///
    /// At most one `queued` row may exist per source (partial unique index);
    /// hitting it is treated as success and returns the existing job id.
    pub async fn enqueue(source_id: SourceId, pool: &PgPool) -> Result<EnqueueResult<IngestionJobId>> {
        // A claimed-and-requeued race between the insert and the lookup can
        // leave neither branch with a row; one more pass settles it.
        for _ in 0..2 {
            let inserted = sqlx::query_scalar::<_, IngestionJobId>(
                r#"
                INSERT INTO ingestion_requests (source_id, status)
                VALUES ($1, 'queued')
                ON CONFLICT (source_id) WHERE status = 'queued'
                DO NOTHING
                RETURNING id
                "#,
            )
            .bind(source_id)
            .fetch_optional(pool)
            .await?;

            if let Some(id) = inserted {
                debug!(source_id = %source_id, job_id = %id, "ingestion job enqueued");
                return Ok(EnqueueResult::Created(id));
            }

            let existing = sqlx::query_scalar::<_, IngestionJobId>(
                "SELECT id FROM ingestion_requests WHERE source_id = $1 AND status = 'queued'",
            )
            .bind(source_id)
            .fetch_optional(pool)
            .await?;

            if let Some(id) = existing {
                debug!(source_id = %source_id, job_id = %id, "ingestion job already queued");
                return Ok(EnqueueResult::AlreadyQueued(id));
            }
        }

        Err(anyhow::anyhow!(
            "could not enqueue ingestion for source {source_id}"
        ))
    }

    /// Atomically claim the oldest queued job, flipping it to `in_progress`.
    ///
    /// `FOR UPDATE SKIP LOCKED` lets multiple workers share the queue
    /// without double-claiming. Returns `None` when the queue is empty.
    pub async fn claim_next(pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE ingestion_requests
            SET status = 'in_progress', updated_at = NOW()
            WHERE id = (
                SELECT id
                FROM ingestion_requests
                WHERE status = 'queued'
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

    pub async fn complete(id: IngestionJobId, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE ingestion_requests
            SET status = 'completed', error_message = NULL, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Terminal until an operator resets the status back to `queued`.
    pub async fn fail(id: IngestionJobId, error: &str, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE ingestion_requests
            SET status = 'failed', error_message = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(error)
        .execute(pool)
        .await?;
        Ok(())
    }
}
