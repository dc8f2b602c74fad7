use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::common::{EvidenceLinkId, EvidenceRunId, HypothesisId, SegmentId};
use crate::domains::evidence::models::EvidenceLink;
use crate::domains::hypotheses::models::Hypothesis;

/// HypothesisSegmentLinkRun - one append-only history row per saved
/// analysis, carrying snapshots of the hypothesis as it stood at commit
/// time.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EvidenceRun {
    pub id: EvidenceRunId,
    pub link_id: EvidenceLinkId,
    pub hypothesis_id: HypothesisId,
    pub segment_id: SegmentId,
    pub verdict: Option<String>,
    pub analysis_text: Option<String>,
    pub authored_by: String,
    pub hypothesis_text_snapshot: String,
    pub description_snapshot: Option<String>,
    pub reference_url_snapshot: Option<String>,
    pub reference_type_snapshot: String,
    pub hypothesis_updated_at_snapshot: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl EvidenceRun {
    /// Append a run mirroring the link's just-written state, with hypothesis
    /// snapshots taken from the row as it stands inside the commit
    /// transaction.
    pub async fn append_in_tx(
        link: &EvidenceLink,
        hypothesis: &Hypothesis,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO hypothesis_segment_link_runs (
                link_id, hypothesis_id, segment_id, verdict, analysis_text,
                authored_by, hypothesis_text_snapshot, description_snapshot,
                reference_url_snapshot, reference_type_snapshot,
                hypothesis_updated_at_snapshot
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(link.id)
        .bind(link.hypothesis_id)
        .bind(link.segment_id)
        .bind(&link.verdict)
        .bind(&link.analysis_text)
        .bind(&link.authored_by)
        .bind(&hypothesis.hypothesis_text)
        .bind(&hypothesis.description)
        .bind(&hypothesis.reference_url)
        .bind(&hypothesis.reference_type)
        .bind(hypothesis.updated_at)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    /// Full run history for one link, oldest first.
    pub async fn list_for_link(link_id: EvidenceLinkId, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM hypothesis_segment_link_runs
            WHERE link_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(link_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
