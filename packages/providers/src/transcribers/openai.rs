//! Transcription via the OpenAI audio endpoint.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::{ProviderError, Result};
use crate::openai::OpenAiClient;
use crate::traits::{AudioWindow, Transcriber, Transcript};

const DEFAULT_MODEL: &str = "gpt-4o-mini-transcribe";

/// [`Transcriber`] that downloads the audio and uploads it to OpenAI.
///
/// The endpoint has no server-side trimming, so windowed requests transcribe
/// the full recording; the requested window is recorded in the transcript
/// metadata and the caller still treats the run as partial.
pub struct OpenAiTranscriber {
    client: OpenAiClient,
    http_client: reqwest::Client,
}

impl OpenAiTranscriber {
    pub fn new(client: OpenAiClient) -> Self {
        Self {
            client,
            http_client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(300))
                .build()
                .expect("reqwest client construction cannot fail with static config"),
        }
    }

    async fn download_audio(&self, audio_url: &str) -> Result<Vec<u8>> {
        let response = self.http_client.get(audio_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Transient(format!(
                "audio download failed: HTTP {status} from {audio_url}"
            )));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl Transcriber for OpenAiTranscriber {
    async fn transcribe(
        &self,
        audio_url: &str,
        window: AudioWindow,
        model: Option<&str>,
    ) -> Result<Transcript> {
        let model = model.unwrap_or(DEFAULT_MODEL);
        info!(audio_url, model, "transcribing via openai");

        if !window.is_full() {
            warn!(
                start = ?window.start_seconds,
                end = ?window.end_seconds,
                "openai transcription cannot trim server-side; transcribing full audio"
            );
        }

        let audio_bytes = self.download_audio(audio_url).await?;
        let text = self
            .client
            .transcribe_audio(model, "audio.mp3", audio_bytes)
            .await?;

        Ok(Transcript {
            metadata: serde_json::json!({
                "provider": "openai",
                "model": model,
                "requested_start_seconds": window.start_seconds,
                "requested_end_seconds": window.end_seconds,
            }),
            text,
        })
    }

    fn name(&self) -> &str {
        "openai"
    }
}
