pub mod document;

pub use document::{DocumentContentData, DocumentListData, DocumentMetadataPatch};
