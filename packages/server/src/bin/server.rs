// HTTP API process: control plane for the evidence graph and job queues.

use std::sync::Arc;

use anyhow::{Context, Result};
use providers::{HttpCrawler, OpenAiAnalyzer, OpenAiClient, OpenAiSuggester};
use server_core::domains::evidence::engine::EvidenceEngine;
use server_core::kernel::reference_cache::ReferenceCache;
use server_core::server::build_app;
use server_core::Config;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug,sqlx=warn,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    // Exit code 2 distinguishes a crash from a startup error (1).
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        default_panic(info);
        std::process::exit(2);
    }));

    tracing::info!("Starting Signal/Noise API server");

    let config = Config::from_env().context("Failed to load configuration")?;
    let openai_key = config.require_openai_key()?.to_string();

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let openai_client = OpenAiClient::new(openai_key);
    let suggester = Arc::new(OpenAiSuggester::new(
        openai_client.clone(),
        config.llm_model.clone(),
    ));
    let analyzer = Arc::new(OpenAiAnalyzer::new(
        openai_client,
        config.llm_model.clone(),
    ));
    let crawler = Arc::new(HttpCrawler::new());

    let reference_cache = ReferenceCache::new(pool.clone(), crawler);
    let engine = EvidenceEngine::new(
        pool.clone(),
        suggester,
        analyzer,
        reference_cache.clone(),
    );

    let app = build_app(pool, engine, reference_cache);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
