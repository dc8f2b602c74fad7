pub mod segment;

pub use segment::{NewSegment, OffsetKind, Segment, SegmentListing, SegmentStatus};
