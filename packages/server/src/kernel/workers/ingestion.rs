//! Ingestion worker: drains the ingestion queue through an [`Ingestor`].

use std::sync::Arc;

use anyhow::Result;
use providers::{with_retry, Ingestor};
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::{error_summary, WorkerConfig};
use crate::domains::documents::models::Document;
use crate::domains::sources::models::Source;
use crate::kernel::queue::IngestionRequest;
use crate::kernel::service_host::Service;

/// Polls `ingestion_requests`, pulls the source's feed, and upserts each
/// yielded record into `documents` by `(source_id, external_id)`.
pub struct IngestionWorker {
    pool: PgPool,
    ingestor: Arc<dyn Ingestor>,
    config: WorkerConfig,
}

impl IngestionWorker {
    pub fn new(pool: PgPool, ingestor: Arc<dyn Ingestor>, config: WorkerConfig) -> Self {
        Self {
            pool,
            ingestor,
            config,
        }
    }

    async fn process_job(&self, job: &IngestionRequest) -> Result<usize> {
        let source = Source::find_by_id(job.source_id, &self.pool).await?;
        let feed = source.to_feed_spec()?;

        let records = with_retry("ingest_feed", || self.ingestor.ingest(&feed)).await?;

        let mut upserted = 0;
        for record in &records {
            Document::upsert_from_record(source.id, record, &self.pool).await?;
            upserted += 1;
        }

        Source::update_last_polled(source.id, &self.pool).await?;
        Ok(upserted)
    }

    async fn drain_one(&self) -> Result<bool> {
        let Some(job) = IngestionRequest::claim_next(&self.pool).await? else {
            return Ok(false);
        };

        info!(job_id = %job.id, source_id = %job.source_id, "ingestion job claimed");

        match self.process_job(&job).await {
            Ok(documents) => {
                IngestionRequest::complete(job.id, &self.pool).await?;
                info!(job_id = %job.id, documents, "ingestion job completed");
            }
            Err(e) => {
                let summary = error_summary(&e);
                warn!(job_id = %job.id, error = %e, "ingestion job failed");
                IngestionRequest::fail(job.id, &summary, &self.pool).await?;
            }
        }

        Ok(true)
    }
}

#[async_trait::async_trait]
impl Service for IngestionWorker {
    fn name(&self) -> &'static str {
        "ingestion-worker"
    }

    async fn run(self: Box<Self>, shutdown: CancellationToken) -> Result<()> {
        loop {
            if shutdown.is_cancelled() {
                break;
            }

            match self.drain_one().await {
                Ok(true) => {} // claimed a job; poll again immediately
                Ok(false) => {
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.config.poll_interval) => {}
                    }
                }
                Err(e) => {
                    error!(error = %e, "ingestion poll failed");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.config.poll_interval) => {}
                    }
                }
            }
        }
        Ok(())
    }
}
