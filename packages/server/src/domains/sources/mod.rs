pub mod data;
pub mod models;

pub use data::SourceData;
pub use models::{Source, SourceType};
