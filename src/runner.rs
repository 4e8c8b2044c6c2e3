//! Form runner — the per-session step state machine.
//!
//! Progresses linearly over the form's questions: each `advance` validates
//! the current answer, stores it, and either moves to the next question or
//! hands off to submission. No step can be skipped and no branching exists.

use crate::error::ValidationError;
use crate::form::model::{AnswerSet, FormConfig, Question};
use crate::form::validate::validate_answer;

/// Where a respondent session currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    /// Waiting for the form to resolve by slug.
    Loading,
    /// No active form matches the slug.
    NotFound,
    /// Presenting question `i`.
    Asking(usize),
    /// Final answers accepted; submission in flight.
    Submitting,
    /// Submission persisted; respondent chooses AI result or expert contact.
    Intermediate,
    /// Displaying the AI analysis.
    ShowingResult,
}

/// Outcome of one `advance` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Validation failed; still on the same step.
    Rejected(ValidationError),
    /// Answer stored; now on the given step.
    Advanced(usize),
    /// Last answer stored; the caller must run the submission pipeline.
    ReadyToSubmit,
    /// The runner is not currently asking a question.
    Ignored,
}

/// Step state machine for one respondent session.
///
/// Owns the form snapshot and the growing answer set. Submission itself is
/// the pipeline's job; the runner only tracks its outcome.
#[derive(Debug)]
pub struct FormRunner {
    form: Option<FormConfig>,
    answers: AnswerSet,
    state: RunnerState,
    step_error: Option<ValidationError>,
    submit_error: Option<String>,
}

impl FormRunner {
    /// A runner waiting for form resolution.
    pub fn loading() -> Self {
        Self {
            form: None,
            answers: AnswerSet::new(),
            state: RunnerState::Loading,
            step_error: None,
            submit_error: None,
        }
    }

    /// A runner for an already-resolved form, starting at the first question.
    pub fn new(form: FormConfig) -> Self {
        Self {
            form: Some(form),
            answers: AnswerSet::new(),
            state: RunnerState::Asking(0),
            step_error: None,
            submit_error: None,
        }
    }

    /// Feed the result of slug resolution into a loading runner.
    pub fn resolved(&mut self, form: Option<FormConfig>) {
        if self.state != RunnerState::Loading {
            return;
        }
        match form {
            Some(form) => {
                self.form = Some(form);
                self.state = RunnerState::Asking(0);
            }
            None => self.state = RunnerState::NotFound,
        }
    }

    pub fn state(&self) -> &RunnerState {
        &self.state
    }

    pub fn form(&self) -> Option<&FormConfig> {
        self.form.as_ref()
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    /// The question currently being asked, if any.
    pub fn current_question(&self) -> Option<&Question> {
        match self.state {
            RunnerState::Asking(i) => self.form.as_ref().and_then(|f| f.questions.get(i)),
            _ => None,
        }
    }

    /// Previously stored answer for the current step (for back navigation).
    pub fn current_answer(&self) -> Option<&str> {
        self.current_question().and_then(|q| self.answers.get(&q.id))
    }

    /// Validation error from the last rejected `advance`, if still unresolved.
    pub fn step_error(&self) -> Option<&ValidationError> {
        self.step_error.as_ref()
    }

    /// Error surfaced by a failed submission, if any.
    pub fn submit_error(&self) -> Option<&str> {
        self.submit_error.as_deref()
    }

    /// `(current step, total steps)` while asking, 1-based for display.
    pub fn progress(&self) -> Option<(usize, usize)> {
        match (self.state, self.form.as_ref()) {
            (RunnerState::Asking(i), Some(form)) => Some((i + 1, form.questions.len())),
            _ => None,
        }
    }

    /// Validate and store an answer for the current question.
    ///
    /// On the last question, moves to `Submitting` and returns
    /// `ReadyToSubmit` — the caller then drives the submission pipeline and
    /// reports back via `submit_succeeded`/`submit_failed`.
    pub fn advance(&mut self, answer: &str) -> StepOutcome {
        let RunnerState::Asking(i) = self.state else {
            return StepOutcome::Ignored;
        };
        let Some(form) = self.form.as_ref() else {
            return StepOutcome::Ignored;
        };
        let Some(question) = form.questions.get(i) else {
            // Form with no questions: nothing to validate, submit immediately.
            self.state = RunnerState::Submitting;
            return StepOutcome::ReadyToSubmit;
        };

        match validate_answer(question, answer) {
            Err(reason) => {
                self.step_error = Some(reason.clone());
                StepOutcome::Rejected(reason)
            }
            Ok(()) => {
                self.step_error = None;
                // A skipped optional question leaves no entry, which renders
                // as "N/A" in the analysis context.
                if !answer.trim().is_empty() {
                    self.answers.insert(question.id.clone(), answer);
                }
                if i + 1 < form.questions.len() {
                    self.state = RunnerState::Asking(i + 1);
                    StepOutcome::Advanced(i + 1)
                } else {
                    self.state = RunnerState::Submitting;
                    StepOutcome::ReadyToSubmit
                }
            }
        }
    }

    /// Step back one question. No-op on the first step or outside `Asking`.
    ///
    /// The answer already entered for the revisited step is kept.
    pub fn back(&mut self) {
        if let RunnerState::Asking(i) = self.state
            && i > 0
        {
            self.state = RunnerState::Asking(i - 1);
            self.step_error = None;
        }
    }

    /// The submission pipeline persisted the lead.
    pub fn submit_succeeded(&mut self) {
        if self.state == RunnerState::Submitting {
            self.state = RunnerState::Intermediate;
            self.submit_error = None;
        }
    }

    /// The submission pipeline failed; return to the last question with the
    /// answers preserved so the respondent can retry without re-entry.
    pub fn submit_failed(&mut self, message: impl Into<String>) {
        if self.state == RunnerState::Submitting {
            let last = self
                .form
                .as_ref()
                .map(|f| f.questions.len().saturating_sub(1))
                .unwrap_or(0);
            self.state = RunnerState::Asking(last);
            self.submit_error = Some(message.into());
        }
    }

    /// Respondent chose to view the AI analysis.
    pub fn choose_ai_result(&mut self) {
        if self.state == RunnerState::Intermediate {
            self.state = RunnerState::ShowingResult;
        }
    }

    /// Expert-contact destination, when the operator configured one.
    ///
    /// The redirect itself is out of scope; the session ends here.
    pub fn expert_link(&self) -> Option<&str> {
        self.form.as_ref().and_then(|f| f.expert_link.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::model::{FormStatus, QuestionType, Theme};
    use chrono::Utc;

    fn form_with(questions: Vec<Question>) -> FormConfig {
        FormConfig {
            id: "f1".into(),
            name: "Test form".into(),
            slug: "test-form".into(),
            status: FormStatus::Active,
            primary_color: "#000".into(),
            theme: Theme::Light,
            questions,
            ai_response_prompt: "Advise the lead".into(),
            products: vec![],
            expert_link: Some("https://wa.me/5511999999999".into()),
            created_at: Utc::now(),
        }
    }

    fn two_question_form() -> FormConfig {
        form_with(vec![
            Question::new("q1", "Qual seu nome?", QuestionType::Text),
            Question::new("q2", "Nível", QuestionType::Select)
                .with_options(vec!["A".into(), "B".into()]),
        ])
    }

    #[test]
    fn resolution_moves_loading_to_first_question() {
        let mut runner = FormRunner::loading();
        assert_eq!(*runner.state(), RunnerState::Loading);
        runner.resolved(Some(two_question_form()));
        assert_eq!(*runner.state(), RunnerState::Asking(0));
        assert_eq!(runner.progress(), Some((1, 2)));
    }

    #[test]
    fn resolution_miss_moves_to_not_found() {
        let mut runner = FormRunner::loading();
        runner.resolved(None);
        assert_eq!(*runner.state(), RunnerState::NotFound);
        assert_eq!(runner.advance("anything"), StepOutcome::Ignored);
    }

    #[test]
    fn required_empty_answer_stays_on_step() {
        let mut runner = FormRunner::new(two_question_form());
        assert_eq!(
            runner.advance(""),
            StepOutcome::Rejected(ValidationError::Required)
        );
        assert_eq!(
            runner.advance("   "),
            StepOutcome::Rejected(ValidationError::Required)
        );
        assert_eq!(*runner.state(), RunnerState::Asking(0));
        assert!(runner.answers().is_empty());
        assert_eq!(runner.step_error(), Some(&ValidationError::Required));
    }

    #[test]
    fn valid_answers_advance_then_submit() {
        let mut runner = FormRunner::new(two_question_form());
        assert_eq!(runner.advance("Jane"), StepOutcome::Advanced(1));
        assert_eq!(*runner.state(), RunnerState::Asking(1));
        assert_eq!(runner.advance("A"), StepOutcome::ReadyToSubmit);
        assert_eq!(*runner.state(), RunnerState::Submitting);
        assert_eq!(runner.answers().get("q1"), Some("Jane"));
        assert_eq!(runner.answers().get("q2"), Some("A"));
    }

    #[test]
    fn select_rejects_unoffered_value() {
        let mut runner = FormRunner::new(two_question_form());
        runner.advance("Jane");
        assert!(matches!(
            runner.advance("C"),
            StepOutcome::Rejected(ValidationError::NotAnOption { .. })
        ));
        assert_eq!(*runner.state(), RunnerState::Asking(1));
    }

    #[test]
    fn back_preserves_answer_and_noop_at_first_step() {
        let mut runner = FormRunner::new(two_question_form());
        runner.back();
        assert_eq!(*runner.state(), RunnerState::Asking(0));

        runner.advance("Jane");
        runner.back();
        assert_eq!(*runner.state(), RunnerState::Asking(0));
        assert_eq!(runner.current_answer(), Some("Jane"));

        // Re-answering overwrites, then traversal continues normally
        assert_eq!(runner.advance("Janet"), StepOutcome::Advanced(1));
        assert_eq!(runner.answers().get("q1"), Some("Janet"));
    }

    #[test]
    fn submit_failure_returns_to_last_step_with_answers() {
        let mut runner = FormRunner::new(two_question_form());
        runner.advance("Jane");
        runner.advance("A");
        assert_eq!(*runner.state(), RunnerState::Submitting);

        runner.submit_failed("database unavailable");
        assert_eq!(*runner.state(), RunnerState::Asking(1));
        assert_eq!(runner.submit_error(), Some("database unavailable"));
        assert_eq!(runner.answers().get("q1"), Some("Jane"));

        // Resubmission is a fresh advance on the last step
        assert_eq!(runner.advance("A"), StepOutcome::ReadyToSubmit);
        runner.submit_succeeded();
        assert_eq!(*runner.state(), RunnerState::Intermediate);
        assert!(runner.submit_error().is_none());
    }

    #[test]
    fn intermediate_choices() {
        let mut runner = FormRunner::new(two_question_form());
        runner.advance("Jane");
        runner.advance("B");
        runner.submit_succeeded();
        assert_eq!(*runner.state(), RunnerState::Intermediate);

        assert_eq!(runner.expert_link(), Some("https://wa.me/5511999999999"));
        runner.choose_ai_result();
        assert_eq!(*runner.state(), RunnerState::ShowingResult);
    }

    #[test]
    fn choose_ai_result_is_guarded() {
        let mut runner = FormRunner::new(two_question_form());
        runner.choose_ai_result();
        assert_eq!(*runner.state(), RunnerState::Asking(0));
    }

    #[test]
    fn advance_ignored_outside_asking() {
        let mut runner = FormRunner::new(two_question_form());
        runner.advance("Jane");
        runner.advance("A");
        // Submitting — further input is ignored
        assert_eq!(runner.advance("extra"), StepOutcome::Ignored);
        runner.submit_succeeded();
        assert_eq!(runner.advance("extra"), StepOutcome::Ignored);
    }

    #[test]
    fn empty_form_submits_immediately() {
        let mut runner = FormRunner::new(form_with(vec![]));
        assert_eq!(runner.advance(""), StepOutcome::ReadyToSubmit);
        assert_eq!(*runner.state(), RunnerState::Submitting);
    }

    #[test]
    fn optional_question_accepts_empty_answer() {
        let mut runner = FormRunner::new(form_with(vec![
            Question::new("q1", "Telefone", QuestionType::Phone).optional(),
            Question::new("q2", "Nome", QuestionType::Text),
        ]));
        assert_eq!(runner.advance(""), StepOutcome::Advanced(1));
    }
}
