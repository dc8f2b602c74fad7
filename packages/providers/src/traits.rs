//! Core trait abstractions and the data they exchange.
//!
//! The server package depends only on these traits; concrete adapters are
//! wired in at process startup.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

// ============================================================================
// Ingestion
// ============================================================================

/// What kind of feed a source points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedKind {
    Rss,
    Podcast,
    Manual,
}

impl std::fmt::Display for FeedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedKind::Rss => write!(f, "rss"),
            FeedKind::Podcast => write!(f, "podcast"),
            FeedKind::Manual => write!(f, "manual"),
        }
    }
}

impl std::str::FromStr for FeedKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "rss" => Ok(FeedKind::Rss),
            "podcast" => Ok(FeedKind::Podcast),
            "manual" => Ok(FeedKind::Manual),
            other => Err(format!("unknown feed kind: {other}")),
        }
    }
}

/// Feed definition handed to an [`Ingestor`].
#[derive(Debug, Clone)]
pub struct FeedSpec {
    pub name: String,
    pub kind: FeedKind,
    pub feed_url: String,
}

/// An asset attached to a document (audio file, transcript window, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetRecord {
    #[serde(rename = "type")]
    pub asset_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl AssetRecord {
    pub fn audio(url: impl Into<String>) -> Self {
        Self {
            asset_type: "audio".to_string(),
            url: Some(url.into()),
            duration_seconds: None,
            start_seconds: None,
            end_seconds: None,
            text: None,
            provider: None,
        }
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }
}

/// One document yielded by an ingestion run.
///
/// `external_id` is the idempotency key: the worker upserts by
/// `(source_id, external_id)`, so repeated ingestion of the same feed must
/// yield stable ids.
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    pub external_id: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub original_url: Option<String>,
    pub media_type: String,
    pub content_text: Option<String>,
    pub content_html: Option<String>,
    pub assets: Vec<AssetRecord>,
    pub provenance: serde_json::Value,
}

/// Produces document records from a feed definition.
#[async_trait]
pub trait Ingestor: Send + Sync {
    /// Pull the feed and return every entry as a document record.
    ///
    /// Must be idempotent over `external_id`.
    async fn ingest(&self, feed: &FeedSpec) -> Result<Vec<DocumentRecord>>;

    /// Short adapter name for logs.
    fn name(&self) -> &str;
}

// ============================================================================
// Transcription
// ============================================================================

/// Optional time window for a partial transcription run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioWindow {
    pub start_seconds: Option<f64>,
    pub end_seconds: Option<f64>,
}

impl AudioWindow {
    pub fn full() -> Self {
        Self {
            start_seconds: None,
            end_seconds: None,
        }
    }

    /// A window covering the whole recording counts as a full-length run.
    pub fn is_full(&self) -> bool {
        self.start_seconds.is_none() && self.end_seconds.is_none()
    }
}

/// Transcript text plus provider-specific metadata.
#[derive(Debug, Clone)]
pub struct Transcript {
    pub text: String,
    pub metadata: serde_json::Value,
}

/// Turns an audio URL into transcript text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(
        &self,
        audio_url: &str,
        window: AudioWindow,
        model: Option<&str>,
    ) -> Result<Transcript>;

    fn name(&self) -> &str;
}

// ============================================================================
// Hypothesis suggestion
// ============================================================================

/// Minimal view of an existing hypothesis handed to the suggester.
#[derive(Debug, Clone, Serialize)]
pub struct HypothesisSummary {
    pub id: Uuid,
    pub hypothesis_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip)]
    pub evidence_count: i64,
}

/// Whether a suggestion reuses an existing hypothesis or proposes a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionSource {
    Existing,
    Generated,
}

/// One suggested hypothesis for a segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub hypothesis_id: Option<Uuid>,
    pub hypothesis_text: String,
    pub description: Option<String>,
    /// Draft analysis of how the segment relates, when the provider offers one.
    pub analysis_text: Option<String>,
    pub source: SuggestionSource,
}

/// Proposes hypotheses relevant to a segment.
#[async_trait]
pub trait Suggester: Send + Sync {
    async fn suggest_hypotheses(
        &self,
        segment_text: &str,
        existing: &[HypothesisSummary],
    ) -> Result<Vec<Suggestion>>;
}

// ============================================================================
// Hypothesis analysis
// ============================================================================

/// Relationship between a segment and a hypothesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Confirms,
    Refutes,
    Nuances,
    Irrelevant,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Confirms => write!(f, "confirms"),
            Verdict::Refutes => write!(f, "refutes"),
            Verdict::Nuances => write!(f, "nuances"),
            Verdict::Irrelevant => write!(f, "irrelevant"),
        }
    }
}

impl std::str::FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "confirms" => Ok(Verdict::Confirms),
            "refutes" => Ok(Verdict::Refutes),
            "nuances" => Ok(Verdict::Nuances),
            "irrelevant" => Ok(Verdict::Irrelevant),
            other => Err(format!("unknown verdict: {other}")),
        }
    }
}

/// Analyzer output: the verdict and its supporting prose.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub verdict: Verdict,
    pub analysis_text: String,
}

/// Judges one segment against one hypothesis.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(
        &self,
        segment_text: &str,
        hypothesis_text: &str,
        description: Option<&str>,
        reference_text: Option<&str>,
    ) -> Result<Analysis>;
}

// ============================================================================
// Reference crawling
// ============================================================================

/// Plain text extracted from a reference document.
#[derive(Debug, Clone)]
pub struct FetchedText {
    pub full_text: String,
    pub character_count: usize,
}

/// Fetches and extracts plain text from a URL (HTML or PDF).
#[async_trait]
pub trait Crawler: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<FetchedText>;
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn verdict_round_trip() {
        for v in [
            Verdict::Confirms,
            Verdict::Refutes,
            Verdict::Nuances,
            Verdict::Irrelevant,
        ] {
            assert_eq!(Verdict::from_str(&v.to_string()).unwrap(), v);
        }
        assert!(Verdict::from_str("plausible").is_err());
    }

    #[test]
    fn full_window_detection() {
        assert!(AudioWindow::full().is_full());
        assert!(!AudioWindow {
            start_seconds: Some(10.0),
            end_seconds: None
        }
        .is_full());
    }

    #[test]
    fn asset_record_serializes_type_field() {
        let asset = AssetRecord::audio("https://example.com/a.mp3").with_duration(120.0);
        let json = serde_json::to_value(&asset).unwrap();
        assert_eq!(json["type"], "audio");
        assert_eq!(json["duration_seconds"], 120.0);
        assert!(json.get("text").is_none());
    }
}
