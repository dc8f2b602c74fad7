use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{HypothesisId, QuestionId};

/// Question - a navigation label grouping related hypotheses.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Question {
    pub id: QuestionId,
    pub question_text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing row: question with its hypothesis count.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct QuestionWithCount {
    pub id: QuestionId,
    pub question_text: String,
    pub created_at: DateTime<Utc>,
    pub hypothesis_count: i64,
}

/// Hypothesis row as seen from a question, with its evidence count.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct QuestionHypothesisRow {
    pub hypothesis_id: HypothesisId,
    pub hypothesis_text: String,
    pub description: Option<String>,
    pub reference_url: Option<String>,
    pub reference_type: String,
    pub evidence_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Result of linking a hypothesis to a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    Linked,
    AlreadyLinked,
}

impl Question {
    pub async fn create(question_text: &str, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO questions (question_text) VALUES ($1) RETURNING *",
        )
        .bind(question_text)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn list_with_counts(pool: &PgPool) -> Result<Vec<QuestionWithCount>> {
        sqlx::query_as::<_, QuestionWithCount>(
            r#"
            SELECT
                q.id,
                q.question_text,
                q.created_at,
                COUNT(qh.hypothesis_id) AS hypothesis_count
            FROM questions q
            LEFT JOIN question_hypotheses qh ON q.id = qh.question_id
            GROUP BY q.id, q.question_text, q.created_at
            ORDER BY q.created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Deleting a question removes only its links; hypotheses survive.
    pub async fn delete(id: QuestionId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Idempotent link: a second identical link is a no-op.
    pub async fn link_hypothesis(
        question_id: QuestionId,
        hypothesis_id: HypothesisId,
        pool: &PgPool,
    ) -> Result<LinkOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO question_hypotheses (question_id, hypothesis_id)
            VALUES ($1, $2)
            ON CONFLICT (question_id, hypothesis_id) DO NOTHING
            "#,
        )
        .bind(question_id)
        .bind(hypothesis_id)
        .execute(pool)
        .await?;

        Ok(if result.rows_affected() > 0 {
            LinkOutcome::Linked
        } else {
            LinkOutcome::AlreadyLinked
        })
    }

    pub async fn list_hypotheses(
        question_id: QuestionId,
        pool: &PgPool,
    ) -> Result<Vec<QuestionHypothesisRow>> {
        sqlx::query_as::<_, QuestionHypothesisRow>(
            r#"
            SELECT
                h.id AS hypothesis_id,
                h.hypothesis_text,
                h.description,
                h.reference_url,
                h.reference_type,
                COALESCE(ev_counts.evidence_count, 0) AS evidence_count,
                h.created_at
            FROM question_hypotheses qh
            JOIN hypotheses h ON qh.hypothesis_id = h.id
            LEFT JOIN (
                SELECT hypothesis_id, COUNT(*) AS evidence_count
                FROM hypothesis_segment_link_runs
                GROUP BY hypothesis_id
            ) ev_counts ON h.id = ev_counts.hypothesis_id
            WHERE qh.question_id = $1
            ORDER BY qh.created_at DESC
            "#,
        )
        .bind(question_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_id_optional(id: QuestionId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM questions WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }
}
