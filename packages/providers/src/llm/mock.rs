//! Scripted LLM adapters for tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{ProviderError, Result};
use crate::traits::{
    Analysis, Analyzer, HypothesisSummary, Suggester, Suggestion, Verdict,
};

/// [`Suggester`] that returns a fixed suggestion list.
pub struct MockSuggester {
    responses: Mutex<Vec<Result<Vec<Suggestion>>>>,
    call_count: AtomicU32,
}

impl MockSuggester {
    pub fn new(suggestions: Vec<Suggestion>) -> Self {
        Self {
            responses: Mutex::new(vec![Ok(suggestions)]),
            call_count: AtomicU32::new(0),
        }
    }

    /// Queue responses returned call-by-call; the last one repeats.
    pub fn with_responses(responses: Vec<Result<Vec<Suggestion>>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            call_count: AtomicU32::new(0),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self::with_responses(vec![Err(error)])
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Suggester for MockSuggester {
    async fn suggest_hypotheses(
        &self,
        _segment_text: &str,
        _existing: &[HypothesisSummary],
    ) -> Result<Vec<Suggestion>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let mut responses = self.responses.lock().unwrap();
        let response = if responses.len() > 1 {
            responses.remove(0)
        } else {
            clone_result(&responses[0])
        };
        response
    }
}

/// [`Analyzer`] that returns a fixed verdict.
pub struct MockAnalyzer {
    verdict: Verdict,
    analysis_text: String,
    fail_with: Mutex<Option<ProviderError>>,
    call_count: AtomicU32,
    saw_reference: AtomicU32,
}

impl MockAnalyzer {
    pub fn new(verdict: Verdict, analysis_text: impl Into<String>) -> Self {
        Self {
            verdict,
            analysis_text: analysis_text.into(),
            fail_with: Mutex::new(None),
            call_count: AtomicU32::new(0),
            saw_reference: AtomicU32::new(0),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        let mock = Self::new(Verdict::Irrelevant, "");
        *mock.fail_with.lock().unwrap() = Some(error);
        mock
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// How many calls carried full reference text.
    pub fn reference_calls(&self) -> u32 {
        self.saw_reference.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Analyzer for MockAnalyzer {
    async fn analyze(
        &self,
        _segment_text: &str,
        _hypothesis_text: &str,
        _description: Option<&str>,
        reference_text: Option<&str>,
    ) -> Result<Analysis> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if reference_text.is_some() {
            self.saw_reference.fetch_add(1, Ordering::SeqCst);
        }
        if let Some(err) = self.fail_with.lock().unwrap().take() {
            return Err(err);
        }
        Ok(Analysis {
            verdict: self.verdict,
            analysis_text: self.analysis_text.clone(),
        })
    }
}

fn clone_result(result: &Result<Vec<Suggestion>>) -> Result<Vec<Suggestion>> {
    match result {
        Ok(suggestions) => Ok(suggestions.clone()),
        Err(err) => Err(ProviderError::Transient(err.to_string())),
    }
}
