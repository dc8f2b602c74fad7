pub mod document;

pub use document::{Document, DocumentListing, IngestStatus, TranscriptStatus};
