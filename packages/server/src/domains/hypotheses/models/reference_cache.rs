use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::common::HypothesisId;

/// Cached reference-document text, one row per hypothesis.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReferenceCacheEntry {
    pub hypothesis_id: HypothesisId,
    pub full_text: String,
    pub character_count: i32,
    pub fetched_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReferenceCacheEntry {
    /// The cached entry if fresher than `max_age_days`, else `None`.
    pub async fn find_fresh(
        hypothesis_id: HypothesisId,
        max_age_days: i64,
        conn: &mut PgConnection,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM hypothesis_reference_cache
            WHERE hypothesis_id = $1
              AND fetched_at > NOW() - ($2 || ' days')::INTERVAL
            "#,
        )
        .bind(hypothesis_id)
        .bind(max_age_days.to_string())
        .fetch_optional(conn)
        .await
        .map_err(Into::into)
    }

    /// Insert or refresh the cached text for a hypothesis.
    pub async fn upsert(
        hypothesis_id: HypothesisId,
        full_text: &str,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO hypothesis_reference_cache
                (hypothesis_id, full_text, character_count, fetched_at, updated_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            ON CONFLICT (hypothesis_id)
            DO UPDATE SET
                full_text = EXCLUDED.full_text,
                character_count = EXCLUDED.character_count,
                fetched_at = NOW(),
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(hypothesis_id)
        .bind(full_text)
        .bind(full_text.chars().count() as i32)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    pub async fn find(hypothesis_id: HypothesisId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM hypothesis_reference_cache WHERE hypothesis_id = $1",
        )
        .bind(hypothesis_id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }
}
