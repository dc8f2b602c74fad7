//! API error taxonomy and its HTTP mapping.
//!
//! Every failure class maps to exactly one status code; bodies are always
//! `{"detail": string}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use providers::ProviderError;
use serde_json::json;
use tracing::error;

use crate::domains::evidence::engine::EngineError;

/// API-visible failure classes.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed input, missing required field, offset out of bounds. 400.
    Validation(String),
    /// Id does not resolve. 404.
    NotFound(String),
    /// State conflict (e.g. duplicate question link surfaced as error). 409.
    Conflict(String),
    /// External LLM/transcription/crawl failed after retries. 502.
    Provider(String),
    /// Deadline exceeded on an adapter call. 504.
    ProviderTimeout(String),
    /// Database unreachable. 503.
    Unavailable(String),
    /// Everything else. 500.
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        ApiError::NotFound(format!("{what} not found"))
    }

    pub fn validation(detail: impl Into<String>) -> Self {
        ApiError::Validation(detail.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Provider(_) => StatusCode::BAD_GATEWAY,
            ApiError::ProviderTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> String {
        match self {
            ApiError::Validation(detail)
            | ApiError::NotFound(detail)
            | ApiError::Conflict(detail)
            | ApiError::Provider(detail)
            | ApiError::ProviderTimeout(detail)
            | ApiError::Unavailable(detail) => detail.clone(),
            // Internal details stay in the logs, not the response body.
            ApiError::Internal(_) => "internal server error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(e) = &self {
            error!(error = ?e, "internal error");
        }
        (self.status(), Json(json!({ "detail": self.detail() }))).into_response()
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Timeout(detail) => ApiError::ProviderTimeout(detail),
            ProviderError::BadRequest(detail) => ApiError::Validation(detail),
            other => ApiError::Provider(other.to_string()),
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::NotFound(what) => ApiError::NotFound(format!("{what} not found")),
            EngineError::Validation(detail) => ApiError::Validation(detail),
            EngineError::Provider(provider_err) => provider_err.into(),
            EngineError::Internal(inner) => ApiError::from(inner),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        // Connectivity failures surface as 503 so callers can distinguish
        // "try later" from a bug.
        for cause in err.chain() {
            if let Some(sqlx_err) = cause.downcast_ref::<sqlx::Error>() {
                match sqlx_err {
                    sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::Io(_)
                    | sqlx::Error::Tls(_) => {
                        return ApiError::Unavailable("database unavailable".to_string());
                    }
                    _ => {}
                }
            }
        }
        ApiError::Internal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_map_to_gateway_statuses() {
        let err: ApiError = ProviderError::Transient("boom".into()).into();
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);

        let err: ApiError = ProviderError::Timeout("slow".into()).into();
        assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);

        let err: ApiError = ProviderError::BadRequest("bad".into()).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn engine_errors_keep_their_classes() {
        let err: ApiError = EngineError::NotFound("segment x".into()).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err: ApiError = EngineError::Validation("empty".into()).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn pool_exhaustion_maps_to_unavailable() {
        let err: ApiError = anyhow::Error::from(sqlx::Error::PoolTimedOut).into();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn internal_detail_is_not_leaked() {
        let err = ApiError::Internal(anyhow::anyhow!("secret connection string"));
        assert_eq!(err.detail(), "internal server error");
    }
}
