use axum::extract::Extension;
use axum::Json;

use crate::domains::sources::data::SourceData;
use crate::domains::sources::models::Source;
use crate::server::app::AppState;
use crate::server::error::ApiError;

/// `GET /sources`
pub async fn list_sources(
    Extension(state): Extension<AppState>,
) -> Result<Json<Vec<SourceData>>, ApiError> {
    let sources = Source::find_all(&state.db_pool).await?;
    Ok(Json(sources.into_iter().map(SourceData::from).collect()))
}
