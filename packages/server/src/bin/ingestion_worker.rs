// Ingestion worker process: drains the ingestion queue.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use providers::FeedIngestor;
use server_core::kernel::service_host::ServiceHost;
use server_core::kernel::workers::{IngestionWorker, WorkerConfig};
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

    tracing::info!("Starting ingestion worker");

    let config = Config::from_env().context("Failed to load configuration")?;

    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    let worker = IngestionWorker::new(
        pool,
        Arc::new(FeedIngestor::new()),
        WorkerConfig::with_poll_interval(Duration::from_secs(config.poll_interval_secs)),
    );

    ServiceHost::new()
        .with_service(worker)
        .run_until_shutdown()
        .await
}
