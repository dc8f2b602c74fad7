use chrono::{DateTime, Utc};
use providers::{Suggestion, SuggestionSource, Verdict};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::{DocumentId, EvidenceLinkId, HypothesisId, SegmentId};
use crate::domains::evidence::engine::{AnalysisMode, CommittedEvidence, EvidenceItem};
use crate::domains::evidence::models::{AuthoredBy, EvidenceEntryRow, SegmentHypothesisRow};

/// One staged evidence item in `POST /segments/{id}/evidence`.
#[derive(Debug, Clone, Deserialize)]
pub struct EvidenceItemPayload {
    pub hypothesis_id: Option<HypothesisId>,
    pub hypothesis_text: String,
    pub description: Option<String>,
    pub verdict: Option<Verdict>,
    pub analysis_text: Option<String>,
    #[serde(default)]
    pub authored_by: AuthoredBy,
}

impl From<EvidenceItemPayload> for EvidenceItem {
    fn from(payload: EvidenceItemPayload) -> Self {
        Self {
            hypothesis_id: payload.hypothesis_id,
            hypothesis_text: payload.hypothesis_text,
            description: payload.description,
            verdict: payload.verdict,
            analysis_text: payload.analysis_text,
            authored_by: payload.authored_by,
        }
    }
}

/// Body of `POST /segments/{id}/evidence`.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitEvidenceRequest {
    pub evidence: Vec<EvidenceItemPayload>,
}

/// Per-item ids written by a commit; the engine's validation result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommittedEvidenceData {
    pub hypothesis_id: HypothesisId,
    pub link_id: EvidenceLinkId,
    pub run_id: Uuid,
}

impl From<CommittedEvidence> for CommittedEvidenceData {
    fn from(committed: CommittedEvidence) -> Self {
        Self {
            hypothesis_id: committed.hypothesis_id,
            link_id: committed.link_id,
            run_id: committed.run_id.into_uuid(),
        }
    }
}

/// One suggestion in the `POST /segments/{id}/hypotheses:suggest` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionData {
    pub hypothesis_id: Option<Uuid>,
    pub hypothesis_text: String,
    pub source: SuggestionSource,
    pub description: Option<String>,
    pub analysis_text: Option<String>,
}

impl From<Suggestion> for SuggestionData {
    fn from(suggestion: Suggestion) -> Self {
        Self {
            hypothesis_id: suggestion.hypothesis_id,
            hypothesis_text: suggestion.hypothesis_text,
            source: suggestion.source,
            description: suggestion.description,
            analysis_text: suggestion.analysis_text,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestResponse {
    pub suggestions: Vec<SuggestionData>,
}

/// Body of `POST /analysis:check_hypothesis`.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckHypothesisRequest {
    pub segment_text: String,
    pub hypothesis_text: String,
    pub hypothesis_description: Option<String>,
    pub reference_url: Option<String>,
    #[serde(default)]
    pub include_full_reference: bool,
    pub hypothesis_id: Option<HypothesisId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckHypothesisResponse {
    pub verdict: Verdict,
    pub analysis_text: String,
    pub analysis_mode: AnalysisMode,
}

/// Body of `POST /analysis:generate_pov`. The production contract is
/// unspecified; the endpoint returns a well-formed stub.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratePovRequest {
    pub segment_id: SegmentId,
    pub hypothesis_text: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratePovResponse {
    pub pov_summary: String,
    pub status: String,
}

/// Entry for `GET /hypotheses/{id}/evidence`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceEntryData {
    pub link_id: EvidenceLinkId,
    pub hypothesis_id: HypothesisId,
    pub segment_id: SegmentId,
    pub verdict: Option<String>,
    pub analysis_text: Option<String>,
    pub authored_by: String,
    pub updated_at: DateTime<Utc>,
    pub freshness_status: String,
    pub segment_text_preview: Option<String>,
    pub document_id: Option<DocumentId>,
    pub document_title: Option<String>,
}

impl From<EvidenceEntryRow> for EvidenceEntryData {
    fn from(row: EvidenceEntryRow) -> Self {
        Self {
            link_id: row.link_id,
            hypothesis_id: row.hypothesis_id,
            segment_id: row.segment_id,
            verdict: row.verdict,
            analysis_text: row.analysis_text,
            authored_by: row.authored_by,
            updated_at: row.updated_at,
            freshness_status: row.freshness_status,
            segment_text_preview: row.segment_text_preview,
            document_id: row.document_id,
            document_title: row.document_title,
        }
    }
}

/// Entry for `GET /segments/{id}/hypotheses`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentHypothesisData {
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

impl From<SegmentHypothesisRow> for SegmentHypothesisData {
    fn from(row: SegmentHypothesisRow) -> Self {
        Self {
            hypothesis_id: row.hypothesis_id,
            hypothesis_text: row.hypothesis_text,
            description: row.description,
            reference_url: row.reference_url,
            reference_type: row.reference_type,
            verdict: row.verdict,
            analysis_text: row.analysis_text,
            authored_by: row.authored_by,
            updated_at: row.updated_at,
            freshness_status: row.freshness_status,
        }
    }
}
