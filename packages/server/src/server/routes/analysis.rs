use axum::extract::Extension;
use axum::Json;
use tracing::info;

use crate::domains::evidence::data::{
    CheckHypothesisRequest, CheckHypothesisResponse, GeneratePovRequest, GeneratePovResponse,
};
use crate::domains::evidence::engine::AnalyzeParams;
use crate::server::app::AppState;
use crate::server::error::ApiError;
use crate::server::routes::ANALYZE_DEADLINE;

/// `POST /analysis:check_hypothesis` - runs the analyzer; no writes.
pub async fn check_hypothesis(
    Extension(state): Extension<AppState>,
    Json(body): Json<CheckHypothesisRequest>,
) -> Result<Json<CheckHypothesisResponse>, ApiError> {
    if body.segment_text.trim().is_empty() {
        return Err(ApiError::validation("segment_text cannot be empty"));
    }
    if body.hypothesis_text.trim().is_empty() {
        return Err(ApiError::validation("hypothesis_text cannot be empty"));
    }

    let params = AnalyzeParams {
        segment_text: body.segment_text,
        hypothesis_text: body.hypothesis_text,
        description: body.hypothesis_description,
        reference_url: body.reference_url,
        include_full_reference: body.include_full_reference,
        hypothesis_id: body.hypothesis_id,
    };

    let outcome = tokio::time::timeout(ANALYZE_DEADLINE, state.engine.analyze(params))
        .await
        .map_err(|_| ApiError::ProviderTimeout("hypothesis check timed out".to_string()))??;

    Ok(Json(CheckHypothesisResponse {
        verdict: outcome.verdict,
        analysis_text: outcome.analysis_text,
        analysis_mode: outcome.analysis_mode,
    }))
}

/// `POST /analysis:generate_pov`
///
/// The production contract for analyst POVs is unspecified; this returns a
/// well-formed empty POV with an explicit not-implemented marker.
pub async fn generate_pov(
    Extension(_state): Extension<AppState>,
    Json(body): Json<GeneratePovRequest>,
) -> Result<Json<GeneratePovResponse>, ApiError> {
    info!(segment_id = %body.segment_id, "pov generation requested (stub)");
    Ok(Json(GeneratePovResponse {
        pov_summary: String::new(),
        status: "not_implemented".to_string(),
    }))
}
