//! Transcription worker: drains the transcription queue through a
//! [`Transcriber`] per provider.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use providers::{with_retry, AssetRecord, AudioWindow, Transcriber};
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::{error_summary, WorkerConfig};
use crate::domains::documents::models::Document;
use crate::kernel::queue::TranscriptionRequest;
use crate::kernel::service_host::Service;

/// Polls `transcription_requests` and runs the matching provider adapter.
///
/// Full-length runs replace the document's `content_text` and mark the
/// transcript complete; windowed runs only append a transcript asset and
/// mark it partial. Prior transcript assets are never deleted.
pub struct TranscriptionWorker {
    pool: PgPool,
    transcribers: HashMap<String, Arc<dyn Transcriber>>,
    config: WorkerConfig,
}

impl TranscriptionWorker {
    pub fn new(
        pool: PgPool,
        transcribers: HashMap<String, Arc<dyn Transcriber>>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            pool,
            transcribers,
            config,
        }
    }

    async fn process_job(&self, job: &TranscriptionRequest) -> Result<String> {
        let transcriber = self
            .transcribers
            .get(&job.provider)
            .with_context(|| format!("no transcriber configured for provider '{}'", job.provider))?
            .clone();

        let document = Document::find_by_id(job.document_id, &self.pool).await?;
        let audio_url = document
            .audio_url()
            .context("document has no audio asset")?
            .to_string();

        let window = AudioWindow {
            start_seconds: job.start_seconds,
            end_seconds: job.end_seconds,
        };

        let transcript = with_retry("transcribe", || {
            transcriber.transcribe(&audio_url, window, job.model.as_deref())
        })
        .await?;

        let asset = AssetRecord {
            asset_type: "transcript".to_string(),
            url: None,
            duration_seconds: None,
            start_seconds: job.start_seconds,
            end_seconds: job.end_seconds,
            text: Some(transcript.text.clone()),
            provider: Some(match &job.model {
                Some(model) => format!("{}:{}", job.provider, model),
                None => job.provider.clone(),
            }),
        };

        // A window covering the whole recording promotes the transcript to
        // the document text.
        let full_text = window.is_full().then_some(transcript.text.as_str());
        Document::append_transcript(document.id, &asset, full_text, &self.pool).await?;

        TranscriptionRequest::merge_metadata(job.id, &transcript.metadata, &self.pool).await?;

        Ok(transcript.text)
    }

    async fn drain_one(&self) -> Result<bool> {
        let Some(job) = TranscriptionRequest::claim_next(&self.pool).await? else {
            return Ok(false);
        };

        info!(
            job_id = %job.id,
            document_id = %job.document_id,
            provider = %job.provider,
            "transcription job claimed"
        );

        match self.process_job(&job).await {
            Ok(text) => {
                TranscriptionRequest::complete(job.id, &text, &self.pool).await?;
                info!(job_id = %job.id, chars = text.len(), "transcription job completed");
            }
            Err(e) => {
                // The audio URL stays on the document; an operator flips the
                // status back to retry.
                let summary = error_summary(&e);
                warn!(job_id = %job.id, error = %e, "transcription job failed");
                TranscriptionRequest::fail(job.id, &summary, &self.pool).await?;
            }
        }

        Ok(true)
    }
}

#[async_trait::async_trait]
impl Service for TranscriptionWorker {
    fn name(&self) -> &'static str {
        "transcription-worker"
    }

    async fn run(self: Box<Self>, shutdown: CancellationToken) -> Result<()> {
        loop {
            if shutdown.is_cancelled() {
                break;
            }

            match self.drain_one().await {
                Ok(true) => {}
                Ok(false) => {
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.config.poll_interval) => {}
                    }
                }
                Err(e) => {
                    error!(error = %e, "transcription poll failed");
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
