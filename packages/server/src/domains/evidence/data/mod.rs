pub mod evidence;

pub use evidence::{
    CheckHypothesisRequest, CheckHypothesisResponse, CommitEvidenceRequest, CommittedEvidenceData,
    EvidenceEntryData, EvidenceItemPayload, GeneratePovRequest, GeneratePovResponse,
    SegmentHypothesisData, SuggestResponse, SuggestionData,
};
