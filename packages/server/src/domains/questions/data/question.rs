use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{HypothesisId, QuestionId};
use crate::domains::questions::models::question::QuestionWithCount;
use crate::domains::questions::models::QuestionHypothesisRow;

/// Body of `POST /questions`.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionCreateRequest {
    pub question_text: String,
}

/// Body of `POST /questions/{id}/hypotheses`.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionLinkRequest {
    pub hypothesis_id: HypothesisId,
}

/// Listing entry for `GET /questions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionData {
    pub question_id: QuestionId,
    pub question_text: String,
    pub created_at: DateTime<Utc>,
    pub hypothesis_count: i64,
}

impl From<QuestionWithCount> for QuestionData {
    fn from(row: QuestionWithCount) -> Self {
        Self {
            question_id: row.id,
            question_text: row.question_text,
            created_at: row.created_at,
            hypothesis_count: row.hypothesis_count,
        }
    }
}

/// Entry for `GET /questions/{id}/hypotheses`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionHypothesisData {
    pub hypothesis_id: HypothesisId,
    pub hypothesis_text: String,
    pub description: Option<String>,
    pub reference_url: Option<String>,
    pub reference_type: String,
    pub evidence_count: i64,
    pub created_at: DateTime<Utc>,
}

impl From<QuestionHypothesisRow> for QuestionHypothesisData {
    fn from(row: QuestionHypothesisRow) -> Self {
        Self {
            hypothesis_id: row.hypothesis_id,
            hypothesis_text: row.hypothesis_text,
            description: row.description,
            reference_url: row.reference_url,
            reference_type: row.reference_type,
            evidence_count: row.evidence_count,
            created_at: row.created_at,
        }
    }
}
