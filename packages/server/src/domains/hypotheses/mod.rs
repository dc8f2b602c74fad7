pub mod data;
pub mod models;

pub use data::{
    HypothesisCreateRequest, HypothesisPatchRequest, HypothesisReferenceData, HypothesisViewData,
};
pub use models::{Hypothesis, HypothesisOverview, HypothesisVersion, ReferenceCacheEntry, ReferenceType};
