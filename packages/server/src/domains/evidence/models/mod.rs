pub mod link;
pub mod run;

pub use link::{AuthoredBy, EvidenceEntryRow, EvidenceLink, SegmentHypothesisRow};
pub use run::EvidenceRun;
