//! Per-answer validation rules.
//!
//! Pure functions: same `(question, value)` pair always yields the same
//! result. The runner calls these on every `advance`; failures block the step
//! and never propagate further.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ValidationError;
use crate::form::model::{Question, QuestionType};

/// `localpart@domain.tld` — at least one `@`, a dot after it, no whitespace.
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));

/// Minimum digit count for a plausible phone number.
const MIN_PHONE_DIGITS: usize = 10;

/// Validate a candidate answer against a question's rules.
///
/// An empty value is only rejected when the question is required; type rules
/// apply to non-empty values regardless of `required`.
pub fn validate_answer(question: &Question, value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return if question.required {
            Err(ValidationError::Required)
        } else {
            Ok(())
        };
    }

    match question.kind {
        QuestionType::Email => {
            if EMAIL_RE.is_match(trimmed) {
                Ok(())
            } else {
                Err(ValidationError::BadEmail)
            }
        }
        QuestionType::Phone => {
            let digits = trimmed.chars().filter(|c| c.is_ascii_digit()).count();
            if digits >= MIN_PHONE_DIGITS {
                Ok(())
            } else {
                Err(ValidationError::BadPhone)
            }
        }
        QuestionType::Select => {
            if question.options.iter().any(|opt| opt == trimmed) {
                Ok(())
            } else {
                Err(ValidationError::NotAnOption {
                    value: trimmed.to_string(),
                })
            }
        }
        QuestionType::Text | QuestionType::LongText | QuestionType::Number => Ok(()),
    }
}
