//! Prompt construction and structured-output parsing.
//!
//! Two directions: asking a model to draft a question list from an authoring
//! objective (JSON out, strictly parsed), and asking it for a lead analysis
//! (free text, accepted opaquely). Shape validation lives here, never in the
//! generation client.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ComposeError;
use crate::form::model::{AnswerSet, Question, QuestionSpec};
use crate::generation::GenerationRequest;

/// First bracket-delimited span, across lines. Providers wrap JSON in prose
/// or code fences more often than not.
static JSON_ARRAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*\]").expect("array regex"));
static JSON_OBJECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("object regex"));

/// Build the request that asks a model to draft questions for an objective.
pub fn question_generation_request(objective: &str) -> GenerationRequest {
    let prompt = format!(
        "Generate a structured JSON form for this objective: \"{objective}\".\n\
         Return ONLY a JSON array. Every element must follow this object schema:\n\
         {{ \"label\": \"string\", \"type\": \"text|longtext|email|phone|number|select\", \
         \"options\": [\"string\"], \"required\": boolean }}"
    );
    GenerationRequest::json(prompt)
}

/// Parse a model's question-list output.
///
/// Extracts the first `[...]` (or `{...}`) span and parses it as JSON. A lone
/// object is accepted as a single-element list. Anything else is
/// `MalformedOutput` — there is no safe default question set.
pub fn parse_question_list(raw: &str) -> Result<Vec<QuestionSpec>, ComposeError> {
    let malformed = || ComposeError::MalformedOutput {
        raw: raw.to_string(),
    };

    let span = extract_json_span(raw).ok_or_else(malformed)?;
    if let Ok(list) = serde_json::from_str::<Vec<QuestionSpec>>(span) {
        return Ok(list);
    }
    if let Ok(single) = serde_json::from_str::<QuestionSpec>(span) {
        return Ok(vec![single]);
    }
    Err(malformed())
}

/// Find the first JSON-looking span in free text.
fn extract_json_span(text: &str) -> Option<&str> {
    JSON_ARRAY_RE
        .find(text)
        .or_else(|| JSON_OBJECT_RE.find(text))
        .map(|m| m.as_str())
}

/// Build the lead-analysis request from the operator template and answers.
///
/// Each question label is paired with its answer ("N/A" when absent) as
/// context; the output is consultative Markdown addressed to the respondent.
pub fn analysis_request(
    template: &str,
    answers: &AnswerSet,
    questions: &[Question],
) -> GenerationRequest {
    let context = answer_context(questions, answers);
    let prompt = format!(
        "You are a specialist consultant.\n\
         Consulting objective: {template}\n\n\
         Answers submitted by the lead:\n\
         {context}\n\
         Analyze these answers and write a personalized, consultative, professional \
         response for the lead, in Markdown. Focus on how their problems can be \
         solved. Keep an encouraging, expert tone."
    );
    GenerationRequest::text(prompt)
}

/// Deterministic substitute analysis when every model attempt is exhausted.
///
/// Itemizes each question/answer pair verbatim so the operator still sees the
/// full picture, and tells the respondent a human will follow up.
pub fn fallback_analysis(questions: &[Question], answers: &AnswerSet) -> String {
    let mut out = String::from(
        "Thank you for submitting your answers.\n\nHere is a summary of what you told us:\n\n",
    );
    for question in questions {
        let answer = answers.get(&question.id).unwrap_or("N/A");
        out.push_str(&format!("- {}: {}\n", question.label, answer));
    }
    out.push_str("\nOur team will review your answers and follow up with you personally.");
    out
}

fn answer_context(questions: &[Question], answers: &AnswerSet) -> String {
    let mut context = String::new();
    for question in questions {
        let answer = answers.get(&question.id).unwrap_or("N/A");
        context.push_str(&format!("{}: {}\n", question.label, answer));
    }
    context
}
