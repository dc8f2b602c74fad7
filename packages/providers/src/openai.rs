//! Minimal OpenAI REST client.
//!
//! Covers exactly what the workbench needs: chat completions for the
//! suggestion/analysis prompts and audio transcriptions for the
//! transcription worker. No streaming, no tools.

use reqwest::multipart;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ProviderError, Result};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponseRaw {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponseRaw {
    text: String,
}

/// Thin OpenAI API client shared by the LLM and transcription adapters.
#[derive(Clone)]
pub struct OpenAiClient {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Set a custom base URL (proxies, compatible endpoints).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Run a chat completion and return the first choice's content.
    pub async fn chat_completion(&self, request: ChatRequest) -> Result<String> {
        debug!(model = %request.model, messages = request.messages.len(), "chat completion request");

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        let raw: ChatResponseRaw = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        raw.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ProviderError::InvalidResponse("no choices in chat response".into()))
    }

    /// Transcribe an audio file via the audio transcriptions endpoint.
    pub async fn transcribe_audio(
        &self,
        model: &str,
        file_name: &str,
        audio_bytes: Vec<u8>,
    ) -> Result<String> {
        debug!(model, bytes = audio_bytes.len(), "audio transcription request");

        let part = multipart::Part::bytes(audio_bytes)
            .file_name(file_name.to_string())
            .mime_str("audio/mpeg")
            .map_err(|e| ProviderError::Config(e.to_string()))?;
        let form = multipart::Form::new()
            .text("model", model.to_string())
            .part("file", part);

        let response = self
            .http_client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        let raw: TranscriptionResponseRaw = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Ok(raw.text)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let summary = format!("{status}: {}", body.chars().take(300).collect::<String>());
        Err(match status.as_u16() {
            429 => ProviderError::RateLimited(summary),
            400..=499 => ProviderError::BadRequest(summary),
            _ => ProviderError::Transient(summary),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_omits_unset_temperature() {
        let request = ChatRequest {
            model: "gpt-4o-mini".into(),
            messages: vec![Message::system("sys"), Message::user("hi")],
            temperature: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("temperature").is_none());
        assert_eq!(json["messages"][0]["role"], "system");
    }
}
