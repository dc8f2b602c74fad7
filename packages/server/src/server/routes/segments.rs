use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::common::SegmentId;
use crate::domains::documents::data::DocumentContentData;
use crate::domains::documents::models::Document;
use crate::domains::evidence::data::{
    CommitEvidenceRequest, CommittedEvidenceData, SegmentHypothesisData, SuggestResponse,
    SuggestionData,
};
use crate::domains::evidence::engine::EvidenceItem;
use crate::domains::segments::data::{
    SegmentCreateRequest, SegmentDetailData, SegmentListData, SegmentWorkbenchData,
};
use crate::domains::segments::models::{NewSegment, OffsetKind, Segment};
use crate::server::app::AppState;
use crate::server::error::ApiError;
use crate::server::routes::PROVIDER_DEADLINE;

/// `GET /segments`
pub async fn list_segments(
    Extension(state): Extension<AppState>,
) -> Result<Json<Vec<SegmentListData>>, ApiError> {
    let rows = Segment::list_all(&state.db_pool).await?;
    Ok(Json(rows.into_iter().map(SegmentListData::from).collect()))
}

#[derive(Debug, Serialize)]
pub struct SegmentCreateResponse {
    pub segment_id: SegmentId,
}

/// `POST /segments`
///
/// Creates a manual segment from a UI selection; text offsets are validated
/// against the parent document's content.
pub async fn create_segment(
    Extension(state): Extension<AppState>,
    Json(body): Json<SegmentCreateRequest>,
) -> Result<(StatusCode, Json<SegmentCreateResponse>), ApiError> {
    let document = Document::find_by_id_optional(body.document_id, &state.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("document {}", body.document_id)))?;

    let new_segment = NewSegment {
        document_id: body.document_id,
        text: body.text.trim().to_string(),
        content_html: body.html.filter(|h| !h.trim().is_empty()),
        start_offset: body.start_offset,
        end_offset: body.end_offset,
        offset_kind: OffsetKind::Text,
        provenance: json!({
            "source": "manual",
            "selection": {
                "offset_kind": "text",
                "stored_start": body.start_offset,
                "stored_end": body.end_offset,
            },
        }),
    };

    let document_text_len = document.content_text.as_deref().map(|t| t.chars().count());
    new_segment
        .validate(document_text_len)
        .map_err(|e| ApiError::validation(e.to_string()))?;

    let segment = Segment::create(&new_segment, &state.db_pool).await?;
    Ok((
        StatusCode::CREATED,
        Json(SegmentCreateResponse {
            segment_id: segment.id,
        }),
    ))
}

/// `GET /segments/{id}`
///
/// The workbench view: the segment plus the full content of its parent
/// document.
pub async fn get_segment_workbench(
    Extension(state): Extension<AppState>,
    Path(id): Path<SegmentId>,
) -> Result<Json<SegmentWorkbenchData>, ApiError> {
    let segment = Segment::find_by_id_optional(id, &state.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("segment {id}")))?;

    let document = Document::find_by_id_optional(segment.document_id, &state.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("document {}", segment.document_id)))?;

    Ok(Json(SegmentWorkbenchData {
        segment: SegmentDetailData::from(segment),
        document: DocumentContentData {
            document_id: document.id,
            content_text: document.content_text.unwrap_or_default(),
            content_html: document.content_html,
        },
    }))
}

/// `DELETE /segments/{id}`
pub async fn delete_segment(
    Extension(state): Extension<AppState>,
    Path(id): Path<SegmentId>,
) -> Result<Json<Value>, ApiError> {
    if !Segment::delete(id, &state.db_pool).await? {
        return Err(ApiError::not_found(format!("segment {id}")));
    }
    Ok(Json(json!({ "status": "deleted", "segment_id": id })))
}

/// `GET /segments/{id}/hypotheses`
pub async fn list_segment_hypotheses(
    Extension(state): Extension<AppState>,
    Path(id): Path<SegmentId>,
) -> Result<Json<Vec<SegmentHypothesisData>>, ApiError> {
    let rows = state.engine.list_hypotheses_for_segment(id).await?;
    Ok(Json(
        rows.into_iter().map(SegmentHypothesisData::from).collect(),
    ))
}

/// `POST /segments/{id}/hypotheses:suggest` - runs the suggester; no writes.
pub async fn suggest_hypotheses(
    Extension(state): Extension<AppState>,
    Path(id): Path<SegmentId>,
) -> Result<Json<SuggestResponse>, ApiError> {
    let suggestions = tokio::time::timeout(PROVIDER_DEADLINE, state.engine.suggest(id))
        .await
        .map_err(|_| ApiError::ProviderTimeout("suggestion timed out".to_string()))??;

    Ok(Json(SuggestResponse {
        suggestions: suggestions.into_iter().map(SuggestionData::from).collect(),
    }))
}

/// `POST /segments/{id}/evidence` - transactional commit: one new run row
/// and one upserted link row per item, all-or-nothing.
pub async fn commit_evidence(
    Extension(state): Extension<AppState>,
    Path(id): Path<SegmentId>,
    Json(body): Json<CommitEvidenceRequest>,
) -> Result<Json<Vec<CommittedEvidenceData>>, ApiError> {
    let items: Vec<EvidenceItem> = body.evidence.into_iter().map(EvidenceItem::from).collect();
    let committed = state.engine.commit_evidence(id, &items).await?;
    Ok(Json(
        committed.into_iter().map(CommittedEvidenceData::from).collect(),
    ))
}
