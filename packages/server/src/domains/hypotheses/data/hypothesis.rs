use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{DocumentId, HypothesisId, SegmentId};
use crate::domains::hypotheses::models::{HypothesisOverview, ReferenceType};

/// Body of `POST /hypotheses`.
#[derive(Debug, Clone, Deserialize)]
pub struct HypothesisCreateRequest {
    pub hypothesis_text: String,
    pub description: Option<String>,
    pub reference_url: Option<String>,
    #[serde(default)]
    pub reference_type: ReferenceType,
}

/// Body of `PATCH /hypotheses/{id}`; absent fields are left unchanged.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct HypothesisPatchRequest {
    pub hypothesis_text: Option<String>,
    pub description: Option<String>,
    pub reference_url: Option<String>,
    pub reference_type: Option<ReferenceType>,
}

/// Listing entry for `GET /hypotheses`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HypothesisViewData {
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

impl From<HypothesisOverview> for HypothesisViewData {
    fn from(row: HypothesisOverview) -> Self {
        Self {
            hypothesis_id: row.hypothesis_id,
            hypothesis_text: row.hypothesis_text,
            description: row.description,
            reference_url: row.reference_url,
            reference_type: row.reference_type,
            last_updated_at: row.last_updated_at,
            evidence_count: row.evidence_count,
            latest_segment_id: row.latest_segment_id,
            latest_segment_text_preview: row.latest_segment_text_preview,
            latest_document_id: row.latest_document_id,
            latest_document_title: row.latest_document_title,
        }
    }
}

/// Body of `GET /hypotheses/{id}/reference`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HypothesisReferenceData {
    pub hypothesis_id: HypothesisId,
    pub reference_url: Option<String>,
    pub reference_type: Option<String>,
    pub full_text: Option<String>,
    pub character_count: Option<i32>,
    pub cached: bool,
}
