pub mod data;
pub mod engine;
pub mod models;

pub use data::{
    CheckHypothesisRequest, CheckHypothesisResponse, CommitEvidenceRequest, CommittedEvidenceData,
    EvidenceEntryData, EvidenceItemPayload, GeneratePovRequest, GeneratePovResponse,
    SegmentHypothesisData, SuggestResponse, SuggestionData,
};
pub use engine::{AnalysisMode, AnalyzeParams, EngineError, EvidenceEngine, EvidenceItem};
pub use models::{AuthoredBy, EvidenceEntryRow, EvidenceLink, EvidenceRun, SegmentHypothesisRow};
