use axum::extract::Extension;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::common::{SourceId, TranscriptionJobId};
use crate::domains::documents::models::Document;
use crate::domains::sources::models::Source;
use crate::kernel::queue::{IngestionRequest, NewTranscriptionRequest, TranscriptionRequest};
use crate::server::app::AppState;
use crate::server::error::ApiError;

/// Body of `POST /ingest-requests`.
#[derive(Debug, Deserialize)]
pub struct IngestRequestBody {
    pub source_ids: Vec<SourceId>,
}

/// `queued_jobs` counts only genuinely new insertions; re-enqueueing an
/// already-queued source is success but does not count.
#[derive(Debug, Serialize)]
pub struct IngestResponseBody {
    pub queued_jobs: usize,
}

/// `POST /ingest-requests`
pub async fn queue_ingestion(
    Extension(state): Extension<AppState>,
    Json(body): Json<IngestRequestBody>,
) -> Result<(StatusCode, Json<IngestResponseBody>), ApiError> {
    if body.source_ids.is_empty() {
        return Err(ApiError::validation("source_ids cannot be empty"));
    }

    for source_id in &body.source_ids {
        Source::find_by_id_optional(*source_id, &state.db_pool)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("source {source_id}")))?;
    }

    let mut queued_jobs = 0;
    for source_id in body.source_ids {
        let result = IngestionRequest::enqueue(source_id, &state.db_pool).await?;
        if result.is_created() {
            queued_jobs += 1;
        }
    }

    Ok((StatusCode::ACCEPTED, Json(IngestResponseBody { queued_jobs })))
}

#[derive(Debug, Serialize)]
pub struct TranscriptionResponseBody {
    pub request_id: TranscriptionJobId,
}

/// `POST /transcription-requests`
pub async fn queue_transcription(
    Extension(state): Extension<AppState>,
    Json(body): Json<NewTranscriptionRequest>,
) -> Result<(StatusCode, Json<TranscriptionResponseBody>), ApiError> {
    if body.provider != "openai" && body.provider != "assembly" {
        return Err(ApiError::validation(format!(
            "unknown provider '{}'",
            body.provider
        )));
    }
    if let (Some(start), Some(end)) = (body.start_seconds, body.end_seconds) {
        if start >= end {
            return Err(ApiError::validation(
                "start_seconds must be less than end_seconds",
            ));
        }
    }

    let document = Document::find_by_id_optional(body.document_id, &state.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("document {}", body.document_id)))?;
    if document.audio_url().is_none() {
        return Err(ApiError::validation("document has no audio asset"));
    }

    let request = TranscriptionRequest::enqueue(&body, &state.db_pool).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(TranscriptionResponseBody {
            request_id: request.id,
        }),
    ))
}
