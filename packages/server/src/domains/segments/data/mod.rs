pub mod segment;

pub use segment::{
    SegmentCreateRequest, SegmentDetailData, SegmentListData, SegmentWorkbenchData,
};
