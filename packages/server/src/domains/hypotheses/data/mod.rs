pub mod hypothesis;

pub use hypothesis::{
    HypothesisCreateRequest, HypothesisPatchRequest, HypothesisReferenceData, HypothesisViewData,
};
