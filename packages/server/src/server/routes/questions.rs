use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::common::QuestionId;
use crate::domains::hypotheses::models::Hypothesis;
use crate::domains::questions::data::{
    QuestionCreateRequest, QuestionData, QuestionHypothesisData, QuestionLinkRequest,
};
use crate::domains::questions::models::Question;
use crate::server::app::AppState;
use crate::server::error::ApiError;

/// `GET /questions`
pub async fn list_questions(
    Extension(state): Extension<AppState>,
) -> Result<Json<Vec<QuestionData>>, ApiError> {
    let rows = Question::list_with_counts(&state.db_pool).await?;
    Ok(Json(rows.into_iter().map(QuestionData::from).collect()))
}

#[derive(Debug, Serialize)]
pub struct QuestionCreateResponse {
    pub question_id: QuestionId,
}

/// `POST /questions`
pub async fn create_question(
    Extension(state): Extension<AppState>,
    Json(body): Json<QuestionCreateRequest>,
) -> Result<(StatusCode, Json<QuestionCreateResponse>), ApiError> {
    if body.question_text.trim().is_empty() {
        return Err(ApiError::validation("question_text cannot be empty"));
    }

    let question = Question::create(&body.question_text, &state.db_pool).await?;
    Ok((
        StatusCode::CREATED,
        Json(QuestionCreateResponse {
            question_id: question.id,
        }),
    ))
}

/// `DELETE /questions/{id}` - removes the question and its links only;
/// hypotheses are untouched.
pub async fn delete_question(
    Extension(state): Extension<AppState>,
    Path(id): Path<QuestionId>,
) -> Result<Json<Value>, ApiError> {
    if !Question::delete(id, &state.db_pool).await? {
        return Err(ApiError::not_found(format!("question {id}")));
    }
    Ok(Json(json!({ "status": "deleted", "question_id": id })))
}

/// `POST /questions/{id}/hypotheses` - idempotent link.
pub async fn link_hypothesis(
    Extension(state): Extension<AppState>,
    Path(id): Path<QuestionId>,
    Json(body): Json<QuestionLinkRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    Question::find_by_id_optional(id, &state.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("question {id}")))?;
    Hypothesis::find_by_id_optional(body.hypothesis_id, &state.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("hypothesis {}", body.hypothesis_id)))?;

    Question::link_hypothesis(id, body.hypothesis_id, &state.db_pool).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "linked",
            "question_id": id,
            "hypothesis_id": body.hypothesis_id,
        })),
    ))
}

/// `GET /questions/{id}/hypotheses`
pub async fn list_question_hypotheses(
    Extension(state): Extension<AppState>,
    Path(id): Path<QuestionId>,
) -> Result<Json<Vec<QuestionHypothesisData>>, ApiError> {
    Question::find_by_id_optional(id, &state.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("question {id}")))?;

    let rows = Question::list_hypotheses(id, &state.db_pool).await?;
    Ok(Json(
        rows.into_iter().map(QuestionHypothesisData::from).collect(),
    ))
}
