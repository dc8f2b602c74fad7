// Transcription worker process: drains the transcription queue.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use providers::{AssemblyTranscriber, OpenAiClient, OpenAiTranscriber, Transcriber};
use server_core::kernel::service_host::ServiceHost;
use server_core::kernel::workers::{TranscriptionWorker, WorkerConfig};
use server_core::Config;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        default_panic(info);
        std::process::exit(2);
    }));

    tracing::info!("Starting transcription worker");

    let config = Config::from_env().context("Failed to load configuration")?;

    let mut transcribers: HashMap<String, Arc<dyn Transcriber>> = HashMap::new();
    if let Some(key) = &config.openai_api_key {
        transcribers.insert(
            "openai".to_string(),
            Arc::new(OpenAiTranscriber::new(OpenAiClient::new(key.clone()))),
        );
    }
    if let Some(key) = &config.assembly_api_key {
        transcribers.insert(
            "assembly".to_string(),
            Arc::new(AssemblyTranscriber::new(key.clone())),
        );
    }
    if transcribers.is_empty() {
        bail!("no transcription provider configured; set OPENAI_API_KEY or ASSEMBLY_API_KEY");
    }
    tracing::info!(
        providers = ?transcribers.keys().collect::<Vec<_>>(),
        "transcription providers configured"
    );

    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    let worker = TranscriptionWorker::new(
        pool,
        transcribers,
        WorkerConfig::with_poll_interval(Duration::from_secs(config.poll_interval_secs)),
    );

    ServiceHost::new()
        .with_service(worker)
        .run_until_shutdown()
        .await
}
