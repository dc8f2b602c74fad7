use anyhow::Result;
use chrono::{DateTime, Utc};
use providers::Verdict;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::common::{DocumentId, EvidenceLinkId, HypothesisId, SegmentId};

/// Who saved an analysis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthoredBy {
    #[default]
    Human,
    Agent,
}

impl std::fmt::Display for AuthoredBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthoredBy::Human => write!(f, "human"),
            AuthoredBy::Agent => write!(f, "agent"),
        }
    }
}

/// HypothesisSegmentLink - the stable latest-state row for one
/// `(hypothesis, segment)` pair. Mirrors the most recent run.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EvidenceLink {
    pub id: EvidenceLinkId,
    pub hypothesis_id: HypothesisId,
    pub segment_id: SegmentId,
    pub verdict: Option<String>,
    pub analysis_text: Option<String>,
    pub authored_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Evidence entry for `GET /hypotheses/{id}/evidence`: one row per link,
/// enriched with segment/document preview and derived freshness.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct EvidenceEntryRow {
    pub link_id: EvidenceLinkId,
    pub hypothesis_id: HypothesisId,
    pub segment_id: SegmentId,
    pub verdict: Option<String>,
    pub analysis_text: Option<String>,
    pub authored_by: String,
    pub updated_at: DateTime<Utc>,
    pub freshness_status: String, // 'current' | 'stale'
    pub segment_text_preview: Option<String>,
    pub document_id: Option<DocumentId>,
    pub document_title: Option<String>,
}

/// Link row as seen from a segment, carrying the hypothesis fields the
/// workbench staging table pre-populates from.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SegmentHypothesisRow {
    pub hypothesis_id: HypothesisId,
    pub hypothesis_text: String,
    pub description: Option<String>,
    pub reference_url: Option<String>,
    pub reference_type: String,
    pub verdict: Option<String>,
    pub analysis_text: Option<String>,
    pub authored_by: String,
    pub updated_at: DateTime<Utc>,
    pub freshness_status: String,
}

impl EvidenceLink {
    /// Insert or update the link for `(hypothesis_id, segment_id)` with the
    /// latest analysis state.
    pub async fn upsert_in_tx(
        hypothesis_id: HypothesisId,
        segment_id: SegmentId,
        verdict: Option<Verdict>,
        analysis_text: Option<&str>,
        authored_by: AuthoredBy,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO hypothesis_segment_links
                (hypothesis_id, segment_id, verdict, analysis_text, authored_by)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (hypothesis_id, segment_id)
            DO UPDATE SET
                verdict = EXCLUDED.verdict,
                analysis_text = EXCLUDED.analysis_text,
                authored_by = EXCLUDED.authored_by,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(hypothesis_id)
        .bind(segment_id)
        .bind(verdict.map(|v| v.to_string()))
        .bind(analysis_text)
        .bind(authored_by.to_string())
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    /// One row per link for a hypothesis, with previews and freshness.
    pub async fn list_for_hypothesis(
        hypothesis_id: HypothesisId,
        pool: &PgPool,
    ) -> Result<Vec<EvidenceEntryRow>> {
        sqlx::query_as::<_, EvidenceEntryRow>(
            r#"
            SELECT
                l.id AS link_id,
                l.hypothesis_id,
                l.segment_id,
                l.verdict,
                l.analysis_text,
                l.authored_by,
                l.updated_at,
                CASE WHEN l.updated_at < h.updated_at THEN 'stale' ELSE 'current' END
                    AS freshness_status,
                LEFT(s.text, 200) AS segment_text_preview,
                d.id AS document_id,
                d.title AS document_title
            FROM hypothesis_segment_links l
            JOIN hypotheses h ON l.hypothesis_id = h.id
            LEFT JOIN segments s ON l.segment_id = s.id
            LEFT JOIN documents d ON s.document_id = d.id
            WHERE l.hypothesis_id = $1
            ORDER BY l.updated_at DESC
            "#,
        )
        .bind(hypothesis_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Current link state for every hypothesis linked to a segment.
    pub async fn list_for_segment(
        segment_id: SegmentId,
        pool: &PgPool,
    ) -> Result<Vec<SegmentHypothesisRow>> {
        sqlx::query_as::<_, SegmentHypothesisRow>(
            r#"
            SELECT
                h.id AS hypothesis_id,
                h.hypothesis_text,
                h.description,
                h.reference_url,
                h.reference_type,
                l.verdict,
                l.analysis_text,
                l.authored_by,
                l.updated_at,
                CASE WHEN l.updated_at < h.updated_at THEN 'stale' ELSE 'current' END
                    AS freshness_status
            FROM hypothesis_segment_links l
            JOIN hypotheses h ON l.hypothesis_id = h.id
            WHERE l.segment_id = $1
            ORDER BY l.updated_at DESC
            "#,
        )
        .bind(segment_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authored_by_serializes_snake_case() {
        assert_eq!(AuthoredBy::Human.to_string(), "human");
        assert_eq!(AuthoredBy::Agent.to_string(), "agent");
        let parsed: AuthoredBy = serde_json::from_str("\"agent\"").unwrap();
        assert_eq!(parsed, AuthoredBy::Agent);
    }
}
