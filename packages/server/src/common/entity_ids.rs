//! Typed ID definitions for all domain entities.

pub use super::id::Id;

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for Source entities (feed definitions).
pub struct Source;

/// Marker type for Document entities (ingested artifacts).
pub struct Document;

/// Marker type for Segment entities (atomic excerpts).
pub struct Segment;

/// Marker type for Hypothesis entities.
pub struct Hypothesis;

/// Marker type for HypothesisVersion snapshot rows.
pub struct HypothesisVersion;

/// Marker type for HypothesisSegmentLink rows (latest state per pair).
pub struct EvidenceLink;

/// Marker type for HypothesisSegmentLinkRun rows (append-only history).
pub struct EvidenceRun;

/// Marker type for Question entities.
pub struct Question;

/// Marker type for QuestionHypothesisLink rows.
pub struct QuestionLink;

/// Marker type for IngestionRequest queue rows.
pub struct IngestionJob;

/// Marker type for TranscriptionRequest queue rows.
pub struct TranscriptionJob;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

pub type SourceId = Id<Source>;
pub type DocumentId = Id<Document>;
pub type SegmentId = Id<Segment>;
pub type HypothesisId = Id<Hypothesis>;
pub type HypothesisVersionId = Id<HypothesisVersion>;
pub type EvidenceLinkId = Id<EvidenceLink>;
pub type EvidenceRunId = Id<EvidenceRun>;
pub type QuestionId = Id<Question>;
pub type QuestionLinkId = Id<QuestionLink>;
pub type IngestionJobId = Id<IngestionJob>;
pub type TranscriptionJobId = Id<TranscriptionJob>;
