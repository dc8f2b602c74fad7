//! Scripted ingestor for tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{ProviderError, Result};
use crate::traits::{DocumentRecord, FeedSpec, Ingestor};

/// [`Ingestor`] that yields a fixed set of document records.
pub struct MockIngestor {
    records: Mutex<Vec<DocumentRecord>>,
    fail_with: Mutex<Option<ProviderError>>,
    call_count: AtomicU32,
}

impl MockIngestor {
    pub fn new(records: Vec<DocumentRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            fail_with: Mutex::new(None),
            call_count: AtomicU32::new(0),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        let mock = Self::new(Vec::new());
        *mock.fail_with.lock().unwrap() = Some(error);
        mock
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Ingestor for MockIngestor {
    async fn ingest(&self, _feed: &FeedSpec) -> Result<Vec<DocumentRecord>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.fail_with.lock().unwrap().take() {
            return Err(err);
        }
        Ok(self.records.lock().unwrap().clone())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
