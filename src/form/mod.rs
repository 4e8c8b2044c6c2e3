//! Form domain — question/answer data model and validation rules.

pub mod model;
pub mod validate;

pub use model::{
    AnswerSet, ContactInfo, FormConfig, FormStatus, Lead, Product, Question, QuestionSpec,
    QuestionType, Theme, slugify,
};
pub use validate::validate_answer;
