pub mod hypothesis;
pub mod reference_cache;
pub mod version;

pub use hypothesis::{Hypothesis, HypothesisOverview, ReferenceType};
pub use reference_cache::ReferenceCacheEntry;
pub use version::HypothesisVersion;
