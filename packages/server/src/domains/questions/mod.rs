pub mod data;
pub mod models;

pub use data::{QuestionCreateRequest, QuestionData, QuestionHypothesisData, QuestionLinkRequest};
pub use models::{LinkOutcome, Question, QuestionHypothesisRow};
