pub mod data;
pub mod models;

pub use data::{SegmentCreateRequest, SegmentDetailData, SegmentListData, SegmentWorkbenchData};
pub use models::{NewSegment, OffsetKind, Segment, SegmentListing, SegmentStatus};
