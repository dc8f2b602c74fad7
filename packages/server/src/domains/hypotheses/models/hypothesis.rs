use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::common::{DocumentId, HypothesisId, SegmentId};

/// Hypothesis - a standing testable proposition.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Hypothesis {
    pub id: HypothesisId,
    pub hypothesis_text: String,
    pub description: Option<String>,
    pub reference_url: Option<String>,
    pub reference_type: String, // 'paper', 'article', 'book', 'website', 'none'
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reference document type; drives the reference-cache TTL.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    Paper,
    Article,
    Book,
    Website,
    #[default]
    None,
}

impl ReferenceType {
    /// Cache TTL: long-lived for stable documents, a week otherwise.
    pub fn cache_ttl_days(&self) -> i64 {
        match self {
            ReferenceType::Paper | ReferenceType::Book => 30,
            _ => 7,
        }
    }
}

impl std::fmt::Display for ReferenceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReferenceType::Paper => write!(f, "paper"),
            ReferenceType::Article => write!(f, "article"),
            ReferenceType::Book => write!(f, "book"),
            ReferenceType::Website => write!(f, "website"),
            ReferenceType::None => write!(f, "none"),
        }
    }
}

impl std::str::FromStr for ReferenceType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "paper" => Ok(ReferenceType::Paper),
            "article" => Ok(ReferenceType::Article),
            "book" => Ok(ReferenceType::Book),
            "website" => Ok(ReferenceType::Website),
            "none" => Ok(ReferenceType::None),
            _ => Err(anyhow::anyhow!("Invalid reference type: {}", s)),
        }
    }
}

/// Content fields an edit can touch; any change snapshots the pre-image.
#[derive(Debug, Clone, Default)]
pub struct HypothesisPatch {
    pub hypothesis_text: Option<String>,
    pub description: Option<String>,
    pub reference_url: Option<String>,
    pub reference_type: Option<ReferenceType>,
}

impl HypothesisPatch {
    pub fn is_empty(&self) -> bool {
        self.hypothesis_text.is_none()
            && self.description.is_none()
            && self.reference_url.is_none()
            && self.reference_type.is_none()
    }
}

/// Listing row for the home view: hypothesis plus evidence stats and the
/// latest linked segment.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct HypothesisOverview {
    pub hypothesis_id: HypothesisId,
    pub hypothesis_text: String,
    pub description: Option<String>,
    pub reference_url: Option<String>,
    pub reference_type: String,
    pub last_updated_at: DateTime<Utc>,
    pub evidence_count: i64,
    pub latest_segment_id: Option<SegmentId>,
    pub latest_segment_text_preview: Option<String>,
    pub latest_document_id: Option<DocumentId>,
    pub latest_document_title: Option<String>,
}

impl Hypothesis {
    pub async fn find_by_id(id: HypothesisId, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>("SELECT * FROM hypotheses WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_id_optional(id: HypothesisId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM hypotheses WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn create(
        hypothesis_text: &str,
        description: Option<&str>,
        reference_url: Option<&str>,
        reference_type: ReferenceType,
        pool: &PgPool,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO hypotheses (hypothesis_text, description, reference_url, reference_type)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(hypothesis_text)
        .bind(description)
        .bind(reference_url)
        .bind(reference_type.to_string())
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Insert within an open transaction (evidence commits create
    /// hypotheses inline).
    pub async fn create_in_tx(
        hypothesis_text: &str,
        description: Option<&str>,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO hypotheses (hypothesis_text, description)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(hypothesis_text)
        .bind(description)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    /// Apply an edit, snapshotting the pre-image into `hypothesis_versions`
    /// when any content field actually changes. Returns `None` when the
    /// hypothesis does not exist.
    pub async fn update(
        id: HypothesisId,
        patch: &HypothesisPatch,
        recorded_by: &str,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let mut tx = pool.begin().await?;
        let updated = Self::update_in_tx(id, patch, recorded_by, &mut tx).await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Transactional body of [`Hypothesis::update`]; also used by the
    /// evidence engine inside its commit transaction.
    pub async fn update_in_tx(
        id: HypothesisId,
        patch: &HypothesisPatch,
        recorded_by: &str,
        conn: &mut PgConnection,
    ) -> Result<Option<Self>> {
        let Some(current) =
            sqlx::query_as::<_, Self>("SELECT * FROM hypotheses WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?
        else {
            return Ok(None);
        };

        let next_text = patch
            .hypothesis_text
            .clone()
            .unwrap_or_else(|| current.hypothesis_text.clone());
        let next_description = patch
            .description
            .clone()
            .or_else(|| current.description.clone());
        let next_reference_url = patch
            .reference_url
            .clone()
            .or_else(|| current.reference_url.clone());
        let next_reference_type = patch
            .reference_type
            .map(|t| t.to_string())
            .unwrap_or_else(|| current.reference_type.clone());

        let changed = next_text != current.hypothesis_text
            || next_description != current.description
            || next_reference_url != current.reference_url
            || next_reference_type != current.reference_type;

        if !changed {
            return Ok(Some(current));
        }

        // Snapshot the pre-image before mutating the row.
        sqlx::query(
            r#"
            INSERT INTO hypothesis_versions (
                hypothesis_id, hypothesis_text, description,
                reference_url, reference_type, recorded_by
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(&current.hypothesis_text)
        .bind(&current.description)
        .bind(&current.reference_url)
        .bind(&current.reference_type)
        .bind(recorded_by)
        .execute(&mut *conn)
        .await?;

        let updated = sqlx::query_as::<_, Self>(
            r#"
            UPDATE hypotheses
            SET hypothesis_text = $2,
                description = $3,
                reference_url = $4,
                reference_type = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&next_text)
        .bind(&next_description)
        .bind(&next_reference_url)
        .bind(&next_reference_type)
        .fetch_one(&mut *conn)
        .await?;

        Ok(Some(updated))
    }

    /// Cascade-deletes links, runs, versions, question links, and the
    /// reference-cache row via foreign keys.
    pub async fn delete(id: HypothesisId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("DELETE FROM hypotheses WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All hypotheses with evidence stats, most recently active first.
    pub async fn list_overview(pool: &PgPool) -> Result<Vec<HypothesisOverview>> {
        sqlx::query_as::<_, HypothesisOverview>(
            r#"
            WITH evidence_stats AS (
                SELECT
                    hypothesis_id,
                    COUNT(*) AS evidence_count,
                    MAX(created_at) AS latest_evidence_at
                FROM hypothesis_segment_link_runs
                GROUP BY hypothesis_id
            ),
            latest_evidence AS (
                SELECT DISTINCT ON (hypothesis_id)
                    hypothesis_id,
                    segment_id
                FROM hypothesis_segment_link_runs
                ORDER BY hypothesis_id, created_at DESC
            )
            SELECT
                h.id AS hypothesis_id,
                h.hypothesis_text,
                h.description,
                h.reference_url,
                h.reference_type,
                GREATEST(COALESCE(es.latest_evidence_at, h.updated_at), h.updated_at) AS last_updated_at,
                COALESCE(es.evidence_count, 0) AS evidence_count,
                le.segment_id AS latest_segment_id,
                LEFT(s.text, 200) AS latest_segment_text_preview,
                d.id AS latest_document_id,
                d.title AS latest_document_title
            FROM hypotheses h
            LEFT JOIN evidence_stats es ON h.id = es.hypothesis_id
            LEFT JOIN latest_evidence le ON h.id = le.hypothesis_id
            LEFT JOIN segments s ON le.segment_id = s.id
            LEFT JOIN documents d ON s.document_id = d.id
            ORDER BY last_updated_at DESC
            "#,
        )
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Hypotheses ordered for the suggester: by evidence count descending,
    /// then most recently updated.
    pub async fn list_for_suggestion(pool: &PgPool) -> Result<Vec<(Self, i64)>> {
        #[derive(sqlx::FromRow)]
        struct Row {
            #[sqlx(flatten)]
            hypothesis: Hypothesis,
            evidence_count: i64,
        }

        let rows = sqlx::query_as::<_, Row>(
            r#"
            SELECT h.*, COALESCE(counts.evidence_count, 0) AS evidence_count
            FROM hypotheses h
            LEFT JOIN (
                SELECT hypothesis_id, COUNT(*) AS evidence_count
                FROM hypothesis_segment_link_runs
                GROUP BY hypothesis_id
            ) counts ON h.id = counts.hypothesis_id
            ORDER BY evidence_count DESC, h.updated_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.hypothesis, row.evidence_count))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_by_reference_type() {
        assert_eq!(ReferenceType::Paper.cache_ttl_days(), 30);
        assert_eq!(ReferenceType::Book.cache_ttl_days(), 30);
        assert_eq!(ReferenceType::Article.cache_ttl_days(), 7);
        assert_eq!(ReferenceType::Website.cache_ttl_days(), 7);
        assert_eq!(ReferenceType::None.cache_ttl_days(), 7);
    }

    #[test]
    fn reference_type_round_trip() {
        use std::str::FromStr;
        for t in [
            ReferenceType::Paper,
            ReferenceType::Article,
            ReferenceType::Book,
            ReferenceType::Website,
            ReferenceType::None,
        ] {
            assert_eq!(ReferenceType::from_str(&t.to_string()).unwrap(), t);
        }
        assert!(ReferenceType::from_str("journal").is_err());
    }

    #[test]
    fn empty_patch_detection() {
        assert!(HypothesisPatch::default().is_empty());
        let patch = HypothesisPatch {
            hypothesis_text: Some("H1-rev".into()),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
