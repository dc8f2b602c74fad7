use axum::extract::Extension;
use axum::Json;
use serde_json::{json, Value};

use crate::server::app::AppState;
use crate::server::error::ApiError;

/// Liveness plus a database round-trip.
pub async fn health_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.db_pool)
        .await
        .map_err(|_| ApiError::Unavailable("database unavailable".to_string()))?;

    Ok(Json(json!({ "status": "ok" })))
}
