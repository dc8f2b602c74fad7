pub mod question;

pub use question::{LinkOutcome, Question, QuestionHypothesisRow};
