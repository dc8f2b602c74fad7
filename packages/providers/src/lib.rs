//! External provider adapters for the Signal/Noise workbench.
//!
//! Everything the core system asks of the outside world goes through one of
//! five trait objects:
//!
//! - [`Ingestor`] - turns a feed definition into document records
//! - [`Transcriber`] - turns an audio URL into transcript text
//! - [`Suggester`] - proposes hypotheses for a text segment
//! - [`Analyzer`] - judges a segment against a single hypothesis
//! - [`Crawler`] - fetches plain text from a reference URL (HTML or PDF)
//!
//! Implementations never retry on their own; callers wrap them with
//! [`retry::with_retry`], which backs off on transient failures and gives up
//! immediately on bad-request errors.
//!
//! Mock implementations for every trait live next to the real ones
//! (`MockIngestor`, `MockTranscriber`, `MockSuggester`, `MockAnalyzer`,
//! `MockCrawler`) so downstream tests never touch the network.

pub mod crawlers;
pub mod error;
pub mod ingestors;
pub mod llm;
pub mod openai;
pub mod retry;
pub mod traits;
pub mod transcribers;

pub use error::{ProviderError, Result};
pub use retry::{with_retry, RetryPolicy};
pub use traits::{
    Analysis, AssetRecord, AudioWindow, DocumentRecord, FeedKind, FeedSpec, FetchedText,
    HypothesisSummary, Suggestion, SuggestionSource, Transcript, Verdict,
};
pub use traits::{Analyzer, Crawler, Ingestor, Suggester, Transcriber};

pub use crawlers::{HttpCrawler, MockCrawler};
pub use ingestors::{FeedIngestor, MockIngestor};
pub use llm::{MockAnalyzer, MockSuggester, OpenAiAnalyzer, OpenAiSuggester};
pub use openai::OpenAiClient;
pub use transcribers::{AssemblyTranscriber, MockTranscriber, OpenAiTranscriber};
