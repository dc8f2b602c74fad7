//! Transcription via the AssemblyAI REST API.
//!
//! Submit the audio URL, then poll the transcript resource until it settles.
//! AssemblyAI trims server-side, so windowed runs pass the requested range as
//! millisecond offsets.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ProviderError, Result};
use crate::traits::{AudioWindow, Transcriber, Transcript};

const DEFAULT_BASE_URL: &str = "https://api.assemblyai.com/v2";
const POLL_INTERVAL: std::time::Duration = std::time::Duration::from_secs(5);
const MAX_POLLS: u32 = 120;

#[derive(Debug, Serialize)]
struct CreateTranscriptRequest {
    audio_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    audio_start_from: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    audio_end_at: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TranscriptResource {
    id: String,
    status: String,
    text: Option<String>,
    error: Option<String>,
    audio_duration: Option<f64>,
}

/// [`Transcriber`] backed by AssemblyAI.
pub struct AssemblyTranscriber {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AssemblyTranscriber {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .expect("reqwest client construction cannot fail with static config"),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn create_transcript(
        &self,
        audio_url: &str,
        window: AudioWindow,
        model: Option<&str>,
    ) -> Result<TranscriptResource> {
        let request = CreateTranscriptRequest {
            audio_url: audio_url.to_string(),
            speech_model: model.map(str::to_string),
            audio_start_from: window.start_seconds.map(|s| (s * 1000.0) as u64),
            audio_end_at: window.end_seconds.map(|s| (s * 1000.0) as u64),
        };

        let response = self
            .client
            .post(format!("{}/transcript", self.base_url))
            .header("authorization", &self.api_key)
            .json(&request)
            .send()
            .await?;

        Self::parse_resource(response).await
    }

    async fn poll_transcript(&self, transcript_id: &str) -> Result<TranscriptResource> {
        let response = self
            .client
            .get(format!("{}/transcript/{transcript_id}", self.base_url))
            .header("authorization", &self.api_key)
            .send()
            .await?;

        Self::parse_resource(response).await
    }

    async fn parse_resource(response: reqwest::Response) -> Result<TranscriptResource> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let summary = format!("{status}: {}", body.chars().take(300).collect::<String>());
            return Err(match status.as_u16() {
                429 => ProviderError::RateLimited(summary),
                400..=499 => ProviderError::BadRequest(summary),
                _ => ProviderError::Transient(summary),
            });
        }
        response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl Transcriber for AssemblyTranscriber {
    async fn transcribe(
        &self,
        audio_url: &str,
        window: AudioWindow,
        model: Option<&str>,
    ) -> Result<Transcript> {
        info!(audio_url, "transcribing via assemblyai");

        let mut resource = self.create_transcript(audio_url, window, model).await?;
        let mut polls = 0;

        while resource.status != "completed" && resource.status != "error" {
            if polls >= MAX_POLLS {
                return Err(ProviderError::Timeout(format!(
                    "transcript {} still {} after {} polls",
                    resource.id, resource.status, polls
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
            polls += 1;
            resource = self.poll_transcript(&resource.id).await?;
            debug!(transcript_id = %resource.id, status = %resource.status, polls, "transcript poll");
        }

        if resource.status == "error" {
            return Err(ProviderError::Transient(format!(
                "assemblyai error: {}",
                resource.error.unwrap_or_else(|| "unknown".to_string())
            )));
        }

        Ok(Transcript {
            metadata: serde_json::json!({
                "provider": "assembly",
                "transcript_id": resource.id,
                "audio_duration_seconds": resource.audio_duration,
                "requested_start_seconds": window.start_seconds,
                "requested_end_seconds": window.end_seconds,
            }),
            text: resource.text.unwrap_or_default(),
        })
    }

    fn name(&self) -> &str {
        "assembly"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_converts_to_milliseconds() {
        let request = CreateTranscriptRequest {
            audio_url: "https://cdn.example.com/a.mp3".into(),
            speech_model: None,
            audio_start_from: Some((12.5f64 * 1000.0) as u64),
            audio_end_at: Some((60.0f64 * 1000.0) as u64),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["audio_start_from"], 12500);
        assert_eq!(json["audio_end_at"], 60000);
        assert!(json.get("speech_model").is_none());
    }
}
