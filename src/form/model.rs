//! Domain types for forms, answers, and leads.
//!
//! A `FormConfig` is authored by the operator and consumed read-only by the
//! runner; it never changes mid-session. A `Lead` is created exactly once, at
//! successful completion of the submission pipeline, and never mutated.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// The kind of answer a question collects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    #[default]
    Text,
    LongText,
    Email,
    Phone,
    Number,
    Select,
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Text => "text",
            Self::LongText => "longtext",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Number => "number",
            Self::Select => "select",
        };
        write!(f, "{s}")
    }
}

/// One question in a form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    /// Offered choices; only meaningful for `select` questions.
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default = "default_true")]
    pub required: bool,
}

impl Question {
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: QuestionType) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
            options: Vec::new(),
            required: true,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }
}

/// A model-suggested question, before it gets an id.
///
/// Providers omit fields freely: missing `type` becomes `text`, missing
/// `required` becomes `true`, missing `options` becomes empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSpec {
    pub label: String,
    #[serde(rename = "type", default)]
    pub kind: QuestionType,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<String>,
}

impl QuestionSpec {
    /// Promote the spec into a full `Question` with the given id.
    pub fn into_question(self, id: impl Into<String>) -> Question {
        Question {
            id: id.into(),
            label: self.label,
            kind: self.kind,
            options: self.options,
            required: self.required,
        }
    }
}

/// Whether a form accepts respondents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormStatus {
    #[default]
    Active,
    Inactive,
}

/// Rendering theme, threaded as plain data to the presentation layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// A product offered on the result screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    #[serde(default)]
    pub image_urls: Vec<String>,
    pub cta_link: String,
}

/// An operator-authored form, resolved once per respondent session by slug.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormConfig {
    pub id: String,
    pub name: String,
    /// URL-safe identifier; resolves to at most one form.
    pub slug: String,
    #[serde(default)]
    pub status: FormStatus,
    pub primary_color: String,
    #[serde(default)]
    pub theme: Theme,
    pub questions: Vec<Question>,
    /// Operator-supplied template for the AI analysis.
    pub ai_response_prompt: String,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub expert_link: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FormConfig {
    pub fn is_active(&self) -> bool {
        self.status == FormStatus::Active
    }

    /// First question of the given type, in form order.
    pub fn first_question_of(&self, kind: QuestionType) -> Option<&Question> {
        self.questions.iter().find(|q| q.kind == kind)
    }
}

/// Answers collected during a session, keyed by question id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet(HashMap<String, String>);

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, question_id: impl Into<String>, value: impl Into<String>) {
        self.0.insert(question_id.into(), value.into());
    }

    pub fn get(&self, question_id: &str) -> Option<&str> {
        self.0.get(question_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Contact fields derived from the answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactInfo {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// A captured lead — the durable outcome of a completed session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    pub form_id: String,
    pub form_name: String,
    /// Frozen copy of the session's answers.
    pub answers: AnswerSet,
    /// AI analysis, or the deterministic fallback text.
    pub ai_response: String,
    pub contact_info: ContactInfo,
    pub timestamp: DateTime<Utc>,
}

/// Derive a URL-safe slug from a display name.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
