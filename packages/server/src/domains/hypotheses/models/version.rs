use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{HypothesisId, HypothesisVersionId};

/// Append-only pre-image snapshot of a hypothesis, recorded before each
/// content edit.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct HypothesisVersion {
    pub id: HypothesisVersionId,
    pub hypothesis_id: HypothesisId,
    pub hypothesis_text: String,
    pub description: Option<String>,
    pub reference_url: Option<String>,
    pub reference_type: String,
    pub recorded_at: DateTime<Utc>,
    pub recorded_by: String,
}

impl HypothesisVersion {
    /// Snapshots for one hypothesis, newest first.
    pub async fn list_for_hypothesis(
        hypothesis_id: HypothesisId,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM hypothesis_versions
            WHERE hypothesis_id = $1
            ORDER BY recorded_at DESC
            "#,
        )
        .bind(hypothesis_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
