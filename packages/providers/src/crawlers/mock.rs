//! Scripted crawler for tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{ProviderError, Result};
use crate::traits::{Crawler, FetchedText};

/// [`Crawler`] that serves canned text and counts fetches.
pub struct MockCrawler {
    text: Mutex<Option<String>>,
    fail_with: Mutex<Option<ProviderError>>,
    fetch_count: AtomicU32,
}

impl MockCrawler {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Mutex::new(Some(text.into())),
            fail_with: Mutex::new(None),
            fetch_count: AtomicU32::new(0),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            text: Mutex::new(None),
            fail_with: Mutex::new(Some(error)),
            fetch_count: AtomicU32::new(0),
        }
    }

    pub fn fetch_count(&self) -> u32 {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Crawler for MockCrawler {
    async fn fetch_text(&self, url: &str) -> Result<FetchedText> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.fail_with.lock().unwrap().take() {
            return Err(err);
        }
        let text = self
            .text
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ProviderError::Transient(format!("no scripted text for {url}")))?;
        let character_count = text.chars().count();
        Ok(FetchedText {
            full_text: text,
            character_count,
        })
    }
}
