//! Scripted transcriber for tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{ProviderError, Result};
use crate::traits::{AudioWindow, Transcriber, Transcript};

/// [`Transcriber`] that returns canned text and records the calls it saw.
pub struct MockTranscriber {
    text: String,
    fail_with: Mutex<Option<ProviderError>>,
    call_count: AtomicU32,
    last_call: Mutex<Option<(String, AudioWindow, Option<String>)>>,
}

impl MockTranscriber {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fail_with: Mutex::new(None),
            call_count: AtomicU32::new(0),
            last_call: Mutex::new(None),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        let mock = Self::new("");
        *mock.fail_with.lock().unwrap() = Some(error);
        mock
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn last_call(&self) -> Option<(String, AudioWindow, Option<String>)> {
        self.last_call.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(
        &self,
        audio_url: &str,
        window: AudioWindow,
        model: Option<&str>,
    ) -> Result<Transcript> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        *self.last_call.lock().unwrap() =
            Some((audio_url.to_string(), window, model.map(str::to_string)));

        if let Some(err) = self.fail_with.lock().unwrap().take() {
            return Err(err);
        }

        Ok(Transcript {
            text: self.text.clone(),
            metadata: serde_json::json!({ "provider": "mock" }),
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}
