pub mod source;

pub use source::SourceData;
