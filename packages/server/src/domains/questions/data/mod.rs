pub mod question;

pub use question::{
    QuestionCreateRequest, QuestionData, QuestionHypothesisData, QuestionLinkRequest,
};
