//! Application setup and router assembly.

use axum::extract::Extension;
use axum::http::header::CONTENT_TYPE;
use axum::http::Method;
use axum::routing::{delete, get, patch, post};
use axum::Router;
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::domains::evidence::engine::EvidenceEngine;
use crate::kernel::reference_cache::ReferenceCache;
use crate::server::routes;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub engine: EvidenceEngine,
    pub reference_cache: ReferenceCache,
}

/// Build the axum application router.
pub fn build_app(pool: PgPool, engine: EvidenceEngine, reference_cache: ReferenceCache) -> Router {
    let app_state = AppState {
        db_pool: pool,
        engine,
        reference_cache,
    };

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/health", get(routes::health::health_handler))
        // Sources and jobs
        .route("/sources", get(routes::sources::list_sources))
        .route("/ingest-requests", post(routes::jobs::queue_ingestion))
        .route(
            "/transcription-requests",
            post(routes::jobs::queue_transcription),
        )
        // Documents
        .route("/documents", get(routes::documents::list_documents))
        .route(
            "/documents/ingest-url",
            post(routes::documents::ingest_document_from_url),
        )
        .route(
            "/documents/{id}",
            patch(routes::documents::update_document_metadata),
        )
        .route(
            "/documents/{id}/archive",
            patch(routes::documents::archive_document),
        )
        .route(
            "/documents/{id}/content",
            get(routes::documents::get_document_content),
        )
        .route(
            "/documents/{id}/segments",
            get(routes::documents::list_document_segments),
        )
        // Segments
        .route(
            "/segments",
            get(routes::segments::list_segments).post(routes::segments::create_segment),
        )
        .route(
            "/segments/{id}",
            get(routes::segments::get_segment_workbench).delete(routes::segments::delete_segment),
        )
        .route(
            "/segments/{id}/hypotheses",
            get(routes::segments::list_segment_hypotheses),
        )
        .route(
            "/segments/{id}/hypotheses:suggest",
            post(routes::segments::suggest_hypotheses),
        )
        .route(
            "/segments/{id}/evidence",
            post(routes::segments::commit_evidence),
        )
        // Hypotheses
        .route(
            "/hypotheses",
            get(routes::hypotheses::list_hypotheses).post(routes::hypotheses::create_hypothesis),
        )
        .route(
            "/hypotheses/{id}",
            patch(routes::hypotheses::update_hypothesis)
                .delete(routes::hypotheses::delete_hypothesis),
        )
        .route(
            "/hypotheses/{id}/evidence",
            get(routes::hypotheses::list_hypothesis_evidence),
        )
        .route(
            "/hypotheses/{id}/reference",
            get(routes::hypotheses::get_hypothesis_reference),
        )
        // Questions
        .route(
            "/questions",
            get(routes::questions::list_questions).post(routes::questions::create_question),
        )
        .route("/questions/{id}", delete(routes::questions::delete_question))
        .route(
            "/questions/{id}/hypotheses",
            get(routes::questions::list_question_hypotheses)
                .post(routes::questions::link_hypothesis),
        )
        // Analysis
        .route(
            "/analysis:check_hypothesis",
            post(routes::analysis::check_hypothesis),
        )
        .route(
            "/analysis:generate_pov",
            post(routes::analysis::generate_pov),
        )
        .layer(Extension(app_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
