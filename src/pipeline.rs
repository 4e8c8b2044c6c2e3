//! Lead submission pipeline and the session coordinator that drives it.
//!
//! Submission degrades, never fails, on generation problems: when every model
//! attempt is exhausted the lead is persisted with a deterministic fallback
//! analysis. Only a storage failure propagates, because losing the lead is
//! the one unacceptable outcome.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::compose;
use crate::error::StorageError;
use crate::form::model::{AnswerSet, ContactInfo, FormConfig, Lead, QuestionType};
use crate::generation::GenerationClient;
use crate::runner::{FormRunner, StepOutcome};
use crate::store::{FormStore, LeadStore};

/// Contact name used when no answer looks like a name.
pub const ANONYMOUS_LEAD_NAME: &str = "Lead Anônimo";

/// Turns a completed answer set into a persisted lead.
pub struct LeadSubmissionPipeline {
    client: GenerationClient,
    leads: Arc<dyn LeadStore>,
}

impl LeadSubmissionPipeline {
    pub fn new(client: GenerationClient, leads: Arc<dyn LeadStore>) -> Self {
        Self { client, leads }
    }

    /// Run the full submission: analysis, contact derivation, persistence.
    pub async fn submit(
        &self,
        form: &FormConfig,
        answers: &AnswerSet,
    ) -> Result<Lead, StorageError> {
        let request = compose::analysis_request(&form.ai_response_prompt, answers, &form.questions);
        let ai_response = match self.client.generate(&request).await {
            Ok(text) => text,
            Err(err) => {
                warn!(form = %form.slug, error = %err, "analysis generation exhausted, using fallback");
                compose::fallback_analysis(&form.questions, answers)
            }
        };

        let lead = Lead {
            id: Uuid::new_v4().to_string(),
            form_id: form.id.clone(),
            form_name: form.name.clone(),
            answers: answers.clone(),
            ai_response,
            contact_info: derive_contact(form, answers),
            timestamp: Utc::now(),
        };

        self.leads.save_lead(&lead).await?;
        info!(form = %form.slug, lead_id = %lead.id, "lead captured");
        Ok(lead)
    }
}

/// Pull contact fields out of the answers by question type and label.
///
/// Email and phone come from the first question of the matching type. The
/// name is the first answer whose question label contains "nome"; absent
/// that, the lead is anonymous.
fn derive_contact(form: &FormConfig, answers: &AnswerSet) -> ContactInfo {
    let answer_for = |id: &str| {
        answers
            .get(id)
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string)
    };

    let email = form
        .first_question_of(QuestionType::Email)
        .and_then(|q| answer_for(&q.id));
    let phone = form
        .first_question_of(QuestionType::Phone)
        .and_then(|q| answer_for(&q.id));
    let name = form
        .questions
        .iter()
        .find(|q| q.label.to_lowercase().contains("nome"))
        .and_then(|q| answer_for(&q.id))
        .unwrap_or_else(|| ANONYMOUS_LEAD_NAME.to_string());

    ContactInfo { name, email, phone }
}

/// One respondent session end to end: resolution, stepping, submission,
/// result choice.
///
/// Wraps the synchronous runner and drives the async pipeline whenever the
/// runner reports `ReadyToSubmit`.
pub struct FormSession {
    runner: FormRunner,
    pipeline: LeadSubmissionPipeline,
    last_lead: Option<Lead>,
}

impl FormSession {
    /// Resolve the slug and start a session.
    pub async fn start(
        forms: Arc<dyn FormStore>,
        pipeline: LeadSubmissionPipeline,
        slug: &str,
    ) -> Result<Self, StorageError> {
        let mut runner = FormRunner::loading();
        let form = forms.resolve(slug).await?;
        if form.is_none() {
            info!(slug, "no active form for slug");
        }
        runner.resolved(form);
        Ok(Self {
            runner,
            pipeline,
            last_lead: None,
        })
    }

    pub fn runner(&self) -> &FormRunner {
        &self.runner
    }

    /// Feed one answer. Runs the submission pipeline when this was the last
    /// step; a storage failure returns the runner to the last question with
    /// the answers intact.
    pub async fn answer(&mut self, value: &str) -> StepOutcome {
        let outcome = self.runner.advance(value);
        if outcome != StepOutcome::ReadyToSubmit {
            return outcome;
        }

        let Some(form) = self.runner.form().cloned() else {
            return outcome;
        };
        let answers = self.runner.answers().clone();

        match self.pipeline.submit(&form, &answers).await {
            Ok(lead) => {
                self.last_lead = Some(lead);
                self.runner.submit_succeeded();
            }
            Err(err) => {
                error!(form = %form.slug, error = %err, "lead submission failed");
                self.runner.submit_failed(err.to_string());
            }
        }
        outcome
    }

    pub fn back(&mut self) {
        self.runner.back();
    }

    /// View the AI analysis after a successful submission.
    pub fn choose_ai_result(&mut self) {
        self.runner.choose_ai_result();
    }

    /// Expert-contact destination, when configured.
    pub fn expert_link(&self) -> Option<&str> {
        self.runner.expert_link()
    }

    /// The persisted lead from this session, if submission succeeded.
    pub fn lead(&self) -> Option<&Lead> {
        self.last_lead.as_ref()
    }

    /// The analysis text shown on the result screen.
    pub fn ai_response(&self) -> Option<&str> {
        self.last_lead.as_ref().map(|l| l.ai_response.as_str())
    }
}
