use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::common::HypothesisId;
use crate::domains::evidence::data::EvidenceEntryData;
use crate::domains::hypotheses::data::{
    HypothesisCreateRequest, HypothesisPatchRequest, HypothesisReferenceData, HypothesisViewData,
};
use crate::domains::hypotheses::models::hypothesis::HypothesisPatch;
use crate::domains::hypotheses::models::Hypothesis;
use crate::server::app::AppState;
use crate::server::error::ApiError;
use crate::server::routes::PROVIDER_DEADLINE;

/// `GET /hypotheses`
pub async fn list_hypotheses(
    Extension(state): Extension<AppState>,
) -> Result<Json<Vec<HypothesisViewData>>, ApiError> {
    let rows = Hypothesis::list_overview(&state.db_pool).await?;
    Ok(Json(rows.into_iter().map(HypothesisViewData::from).collect()))
}

#[derive(Debug, Serialize)]
pub struct HypothesisCreateResponse {
    pub hypothesis_id: HypothesisId,
}

/// `POST /hypotheses`
pub async fn create_hypothesis(
    Extension(state): Extension<AppState>,
    Json(body): Json<HypothesisCreateRequest>,
) -> Result<(StatusCode, Json<HypothesisCreateResponse>), ApiError> {
    if body.hypothesis_text.trim().is_empty() {
        return Err(ApiError::validation("hypothesis_text cannot be empty"));
    }

    let hypothesis = Hypothesis::create(
        &body.hypothesis_text,
        body.description.as_deref(),
        body.reference_url.as_deref(),
        body.reference_type,
        &state.db_pool,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(HypothesisCreateResponse {
            hypothesis_id: hypothesis.id,
        }),
    ))
}

/// `PATCH /hypotheses/{id}` - a content change snapshots the pre-image into
/// `hypothesis_versions` and marks existing link analyses stale.
pub async fn update_hypothesis(
    Extension(state): Extension<AppState>,
    Path(id): Path<HypothesisId>,
    Json(body): Json<HypothesisPatchRequest>,
) -> Result<Json<Hypothesis>, ApiError> {
    let patch = HypothesisPatch {
        hypothesis_text: body.hypothesis_text,
        description: body.description,
        reference_url: body.reference_url,
        reference_type: body.reference_type,
    };
    if patch.is_empty() {
        return Err(ApiError::validation("no fields to update"));
    }
    if let Some(text) = &patch.hypothesis_text {
        if text.trim().is_empty() {
            return Err(ApiError::validation("hypothesis_text cannot be empty"));
        }
    }

    let updated = Hypothesis::update(id, &patch, "api", &state.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("hypothesis {id}")))?;

    Ok(Json(updated))
}

/// `DELETE /hypotheses/{id}` - cascades to links, runs, versions, question
/// links, and the reference-cache row.
pub async fn delete_hypothesis(
    Extension(state): Extension<AppState>,
    Path(id): Path<HypothesisId>,
) -> Result<Json<Value>, ApiError> {
    if !Hypothesis::delete(id, &state.db_pool).await? {
        return Err(ApiError::not_found(format!("hypothesis {id}")));
    }
    Ok(Json(json!({ "status": "deleted", "hypothesis_id": id })))
}

/// `GET /hypotheses/{id}/evidence` - one row per link with freshness.
pub async fn list_hypothesis_evidence(
    Extension(state): Extension<AppState>,
    Path(id): Path<HypothesisId>,
) -> Result<Json<Vec<EvidenceEntryData>>, ApiError> {
    let rows = state.engine.list_evidence_for_hypothesis(id).await?;
    Ok(Json(rows.into_iter().map(EvidenceEntryData::from).collect()))
}

/// `GET /hypotheses/{id}/reference` - fetch-or-cached reference text.
pub async fn get_hypothesis_reference(
    Extension(state): Extension<AppState>,
    Path(id): Path<HypothesisId>,
) -> Result<Json<HypothesisReferenceData>, ApiError> {
    let hypothesis = Hypothesis::find_by_id_optional(id, &state.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("hypothesis {id}")))?;

    if hypothesis.reference_url.is_none() {
        return Ok(Json(HypothesisReferenceData {
            hypothesis_id: id,
            reference_url: None,
            reference_type: None,
            full_text: None,
            character_count: None,
            cached: false,
        }));
    }

    let reference = tokio::time::timeout(
        PROVIDER_DEADLINE,
        state.reference_cache.get_reference_text(&hypothesis),
    )
    .await
    .map_err(|_| ApiError::ProviderTimeout("reference fetch timed out".to_string()))?
    .map_err(|e| ApiError::Provider(format!("reference fetch failed: {e}")))?;

    let (full_text, character_count, cached) = match reference {
        Some(r) => (Some(r.full_text), Some(r.character_count), r.cached),
        None => (None, None, false),
    };

    Ok(Json(HypothesisReferenceData {
        hypothesis_id: id,
        reference_url: hypothesis.reference_url,
        reference_type: Some(hypothesis.reference_type),
        full_text,
        character_count,
        cached,
    }))
}
