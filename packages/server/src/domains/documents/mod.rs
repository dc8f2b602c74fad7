pub mod data;
pub mod models;

pub use data::{DocumentContentData, DocumentListData, DocumentMetadataPatch};
pub use models::{Document, DocumentListing, IngestStatus, TranscriptStatus};
