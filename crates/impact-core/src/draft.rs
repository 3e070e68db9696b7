use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::analysis::ImpactAnalysis;
use crate::area::AnswerValue;
use crate::error::{DecisionError, Result};

// ---------------------------------------------------------------------------
// Input bounds
// ---------------------------------------------------------------------------

/// Minimum characters of free text required to submit a decision.
pub const MIN_INPUT_CHARS: usize = 10;
/// Maximum characters of free text accepted.
pub const MAX_INPUT_CHARS: usize = 5000;

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Lifecycle state of one in-progress decision.
///
/// `Input` is the initial state. There is no terminal state variant:
/// successful creation ends the session and the draft is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Input,
    Processing,
    Chat,
    Summary,
    Error,
    Creating,
}

impl Lifecycle {
    pub fn as_str(self) -> &'static str {
        match self {
            Lifecycle::Input => "input",
            Lifecycle::Processing => "processing",
            Lifecycle::Chat => "chat",
            Lifecycle::Summary => "summary",
            Lifecycle::Error => "error",
            Lifecycle::Creating => "creating",
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// DecisionDraft
// ---------------------------------------------------------------------------

/// The unit of work for one new-decision session.
///
/// A draft is mutated exclusively through its transition methods; each
/// method guards the source state and returns
/// [`DecisionError::InvalidTransition`] when called out of order. Invariants
/// maintained here:
///
/// - `analysis` is present whenever the lifecycle is `Chat`, `Summary`, or
///   `Creating`;
/// - `answers` is non-empty only in those same states, and every recorded
///   index is a valid question index;
/// - `generation` changes whenever an analysis round starts or is abandoned,
///   so a late-arriving response for an earlier round is discarded instead
///   of being applied to a draft that has moved on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionDraft {
    pub id: Uuid,
    pub workspace_id: String,
    pub original_text: String,
    pub analysis: Option<ImpactAnalysis>,
    pub answers: BTreeMap<usize, AnswerValue>,
    /// True when `analysis` came from the model; false for the neutral
    /// analysis synthesized by continue-without-AI.
    pub ai_generated: bool,
    pub started_at: DateTime<Utc>,
    lifecycle: Lifecycle,
    generation: u64,
}

impl DecisionDraft {
    pub fn new(workspace_id: impl Into<String>) -> Self {
        DecisionDraft {
            id: Uuid::new_v4(),
            workspace_id: workspace_id.into(),
            original_text: String::new(),
            analysis: None,
            answers: BTreeMap::new(),
            ai_generated: false,
            started_at: Utc::now(),
            lifecycle: Lifecycle::Input,
            generation: 0,
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Current analysis round. Captured when an analysis call is issued and
    /// checked again in [`DecisionDraft::apply_analysis`].
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn question_count(&self) -> usize {
        self.analysis
            .as_ref()
            .map(|a| a.clarifying_questions.len())
            .unwrap_or(0)
    }

    // -----------------------------------------------------------------------
    // Input → Processing
    // -----------------------------------------------------------------------

    /// Submit free text for analysis.
    ///
    /// Returns `Ok(true)` and moves to `Processing` when the text is within
    /// bounds; `Ok(false)` (no transition, text not stored) when it is too
    /// short or too long.
    pub fn submit(&mut self, text: &str) -> Result<bool> {
        self.expect(Lifecycle::Input, Lifecycle::Processing)?;
        let chars = text.chars().count();
        if !(MIN_INPUT_CHARS..=MAX_INPUT_CHARS).contains(&chars) {
            return Ok(false);
        }
        self.original_text = text.to_string();
        self.generation += 1;
        self.lifecycle = Lifecycle::Processing;
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Processing → Chat / Error
    // -----------------------------------------------------------------------

    /// Apply a completed analysis for the given round.
    ///
    /// Returns `false` (and discards the analysis) when the draft is no
    /// longer processing that round — the caller navigated away and the
    /// response is stale.
    pub fn apply_analysis(&mut self, generation: u64, analysis: ImpactAnalysis) -> bool {
        if self.lifecycle != Lifecycle::Processing || generation != self.generation {
            return false;
        }
        self.analysis = Some(analysis);
        self.ai_generated = true;
        self.lifecycle = Lifecycle::Chat;
        true
    }

    /// Record an analysis failure for the given round. Stale failures are
    /// discarded the same way stale successes are.
    pub fn fail_analysis(&mut self, generation: u64) -> bool {
        if self.lifecycle != Lifecycle::Processing || generation != self.generation {
            return false;
        }
        self.lifecycle = Lifecycle::Error;
        true
    }

    // -----------------------------------------------------------------------
    // Error recovery
    // -----------------------------------------------------------------------

    /// Re-issue the same `original_text` after a failure.
    pub fn retry(&mut self) -> Result<()> {
        self.expect(Lifecycle::Error, Lifecycle::Processing)?;
        self.generation += 1;
        self.lifecycle = Lifecycle::Processing;
        Ok(())
    }

    /// Proceed without AI: synthesize a neutral analysis (all areas
    /// `to_review`, zero questions) and go straight to `Summary` — with no
    /// questions there is nothing to chat about.
    pub fn continue_without_ai(&mut self) -> Result<()> {
        self.expect(Lifecycle::Error, Lifecycle::Summary)?;
        self.analysis = Some(ImpactAnalysis::neutral());
        self.ai_generated = false;
        self.answers.clear();
        self.lifecycle = Lifecycle::Summary;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Chat
    // -----------------------------------------------------------------------

    /// Record the answer for one question index.
    pub fn record_answer(&mut self, index: usize, answer: AnswerValue) -> Result<()> {
        self.expect(Lifecycle::Chat, Lifecycle::Chat)?;
        let total = self.question_count();
        if index >= total {
            return Err(DecisionError::QuestionOutOfRange { index, total });
        }
        self.answers.insert(index, answer);
        Ok(())
    }

    /// Backfill every unanswered question with `not_sure`. Returns the
    /// indices that were filled.
    pub fn skip_remaining(&mut self) -> Result<Vec<usize>> {
        self.expect(Lifecycle::Chat, Lifecycle::Chat)?;
        let total = self.question_count();
        let mut filled = Vec::new();
        for index in 0..total {
            if !self.answers.contains_key(&index) {
                self.answers.insert(index, AnswerValue::NotSure);
                filled.push(index);
            }
        }
        Ok(filled)
    }

    /// Chat → Summary, allowed only once every question has an answer.
    pub fn complete_chat(&mut self) -> Result<()> {
        self.expect(Lifecycle::Chat, Lifecycle::Summary)?;
        let total = self.question_count();
        if (0..total).any(|i| !self.answers.contains_key(&i)) {
            return Err(DecisionError::InvalidTransition {
                from: Lifecycle::Chat,
                to: Lifecycle::Summary,
                reason: format!("{} of {} questions unanswered", self.unanswered(), total),
            });
        }
        self.lifecycle = Lifecycle::Summary;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Backward navigation
    // -----------------------------------------------------------------------

    /// Summary → Chat. Answers and analysis are kept.
    pub fn back_to_chat(&mut self) -> Result<()> {
        self.expect(Lifecycle::Summary, Lifecycle::Chat)?;
        self.lifecycle = Lifecycle::Chat;
        Ok(())
    }

    /// Back to `Input` from `Processing`, `Chat`, or `Error`, discarding the
    /// analysis and all answers. Bumps the generation so an in-flight
    /// response for the abandoned round can never be applied.
    pub fn back_to_input(&mut self) -> Result<()> {
        match self.lifecycle {
            Lifecycle::Processing | Lifecycle::Chat | Lifecycle::Error => {
                self.analysis = None;
                self.answers.clear();
                self.ai_generated = false;
                self.generation += 1;
                self.lifecycle = Lifecycle::Input;
                Ok(())
            }
            from => Err(DecisionError::InvalidTransition {
                from,
                to: Lifecycle::Input,
                reason: "back is only available before the summary is confirmed".to_string(),
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------------

    /// Summary → Creating.
    pub fn begin_create(&mut self) -> Result<()> {
        self.expect(Lifecycle::Summary, Lifecycle::Creating)?;
        self.lifecycle = Lifecycle::Creating;
        Ok(())
    }

    /// Persistence failed: return to `Summary` with answers intact so the
    /// user's work is not lost.
    pub fn create_failed(&mut self) -> Result<()> {
        self.expect(Lifecycle::Creating, Lifecycle::Summary)?;
        self.lifecycle = Lifecycle::Summary;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn unanswered(&self) -> usize {
        (0..self.question_count())
            .filter(|i| !self.answers.contains_key(i))
            .count()
    }

    fn expect(&self, from: Lifecycle, to: Lifecycle) -> Result<()> {
        if self.lifecycle != from {
            return Err(DecisionError::InvalidTransition {
                from: self.lifecycle,
                to,
                reason: format!("draft is in state {}", self.lifecycle),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn analysis_with_questions(n: usize) -> ImpactAnalysis {
        let questions: Vec<String> = (0..n).map(|i| format!("Question {i}?")).collect();
        ImpactAnalysis::from_untrusted(&json!({
            "summary": "Decision: replace Slack with Microsoft Teams.",
            "ai_context": "Channels, integrations and retention settings change.",
            "clarifying_questions": questions,
        }))
    }

    fn draft_in_chat(questions: usize) -> DecisionDraft {
        let mut draft = DecisionDraft::new("ws-1");
        assert!(draft
            .submit("We are moving from Slack to Microsoft Teams for all internal communication.")
            .unwrap());
        let generation = draft.generation();
        assert!(draft.apply_analysis(generation, analysis_with_questions(questions)));
        draft
    }

    #[test]
    fn short_text_is_a_no_op() {
        let mut draft = DecisionDraft::new("ws-1");
        assert!(!draft.submit("too short").unwrap());
        assert_eq!(draft.lifecycle(), Lifecycle::Input);
        assert!(draft.original_text.is_empty());
    }

    #[test]
    fn overlong_text_is_a_no_op() {
        let mut draft = DecisionDraft::new("ws-1");
        let text = "x".repeat(MAX_INPUT_CHARS + 1);
        assert!(!draft.submit(&text).unwrap());
        assert_eq!(draft.lifecycle(), Lifecycle::Input);
    }

    #[test]
    fn submit_moves_to_processing() {
        let mut draft = DecisionDraft::new("ws-1");
        assert!(draft.submit("We are rolling out a new VPN.").unwrap());
        assert_eq!(draft.lifecycle(), Lifecycle::Processing);
        assert_eq!(draft.generation(), 1);
    }

    #[test]
    fn submit_from_wrong_state_is_an_error() {
        let mut draft = draft_in_chat(2);
        assert!(matches!(
            draft.submit("We are rolling out a new VPN."),
            Err(DecisionError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn stale_analysis_is_discarded() {
        let mut draft = DecisionDraft::new("ws-1");
        draft.submit("We are rolling out a new VPN.").unwrap();
        let stale = draft.generation();
        draft.back_to_input().unwrap();
        // The response for the abandoned round arrives late.
        assert!(!draft.apply_analysis(stale, analysis_with_questions(2)));
        assert_eq!(draft.lifecycle(), Lifecycle::Input);
        assert!(draft.analysis.is_none());
    }

    #[test]
    fn stale_failure_is_discarded() {
        let mut draft = DecisionDraft::new("ws-1");
        draft.submit("We are rolling out a new VPN.").unwrap();
        let stale = draft.generation();
        draft.back_to_input().unwrap();
        assert!(!draft.fail_analysis(stale));
        assert_eq!(draft.lifecycle(), Lifecycle::Input);
    }

    #[test]
    fn failure_then_retry_reissues_same_text() {
        let mut draft = DecisionDraft::new("ws-1");
        draft.submit("We are rolling out a new VPN.").unwrap();
        let generation = draft.generation();
        assert!(draft.fail_analysis(generation));
        assert_eq!(draft.lifecycle(), Lifecycle::Error);

        draft.retry().unwrap();
        assert_eq!(draft.lifecycle(), Lifecycle::Processing);
        assert_eq!(draft.original_text, "We are rolling out a new VPN.");
        assert_eq!(draft.generation(), generation + 1);
    }

    #[test]
    fn continue_without_ai_goes_straight_to_summary() {
        let mut draft = DecisionDraft::new("ws-1");
        draft.submit("We are rolling out a new VPN.").unwrap();
        let generation = draft.generation();
        draft.fail_analysis(generation);
        draft.continue_without_ai().unwrap();

        assert_eq!(draft.lifecycle(), Lifecycle::Summary);
        assert!(!draft.ai_generated);
        let analysis = draft.analysis.as_ref().unwrap();
        assert!(analysis.clarifying_questions.is_empty());
        assert!(analysis.suggested_actions.is_empty());
        for (_, level) in analysis.area_suggestions.iter() {
            assert_eq!(level, crate::SuggestionLevel::ToReview);
        }
    }

    #[test]
    fn chat_requires_all_answers_before_summary() {
        let mut draft = draft_in_chat(2);
        draft.record_answer(0, AnswerValue::Yes).unwrap();
        assert!(draft.complete_chat().is_err());
        draft
            .record_answer(1, AnswerValue::Text("Everyone by Q2".into()))
            .unwrap();
        draft.complete_chat().unwrap();
        assert_eq!(draft.lifecycle(), Lifecycle::Summary);
        assert_eq!(draft.answers.len(), 2);
    }

    #[test]
    fn answer_out_of_range_is_rejected() {
        let mut draft = draft_in_chat(2);
        assert!(matches!(
            draft.record_answer(2, AnswerValue::Yes),
            Err(DecisionError::QuestionOutOfRange { index: 2, total: 2 })
        ));
    }

    #[test]
    fn skip_remaining_backfills_not_sure() {
        let mut draft = draft_in_chat(4);
        draft.record_answer(0, AnswerValue::Yes).unwrap();
        let filled = draft.skip_remaining().unwrap();
        assert_eq!(filled, vec![1, 2, 3]);
        draft.complete_chat().unwrap();
        assert_eq!(draft.answers[&0], AnswerValue::Yes);
        for i in 1..4 {
            assert_eq!(draft.answers[&i], AnswerValue::NotSure);
        }
    }

    #[test]
    fn back_from_chat_discards_analysis_and_answers() {
        let mut draft = draft_in_chat(2);
        draft.record_answer(0, AnswerValue::No).unwrap();
        draft.back_to_input().unwrap();
        assert_eq!(draft.lifecycle(), Lifecycle::Input);
        assert!(draft.analysis.is_none());
        assert!(draft.answers.is_empty());
    }

    #[test]
    fn summary_back_keeps_answers() {
        let mut draft = draft_in_chat(1);
        draft.record_answer(0, AnswerValue::Yes).unwrap();
        draft.complete_chat().unwrap();
        draft.back_to_chat().unwrap();
        assert_eq!(draft.lifecycle(), Lifecycle::Chat);
        assert_eq!(draft.answers.len(), 1);
        // Everything already answered, so the user can proceed again.
        draft.complete_chat().unwrap();
        assert_eq!(draft.lifecycle(), Lifecycle::Summary);
    }

    #[test]
    fn create_failure_returns_to_summary() {
        let mut draft = draft_in_chat(1);
        draft.record_answer(0, AnswerValue::Yes).unwrap();
        draft.complete_chat().unwrap();
        draft.begin_create().unwrap();
        assert_eq!(draft.lifecycle(), Lifecycle::Creating);
        draft.create_failed().unwrap();
        assert_eq!(draft.lifecycle(), Lifecycle::Summary);
        assert_eq!(draft.answers.len(), 1);
    }

    #[test]
    fn back_is_not_available_while_creating() {
        let mut draft = draft_in_chat(0);
        draft.complete_chat().unwrap();
        draft.begin_create().unwrap();
        assert!(draft.back_to_input().is_err());
    }

    #[test]
    fn zero_questions_chat_completes_immediately() {
        let mut draft = draft_in_chat(0);
        draft.complete_chat().unwrap();
        assert_eq!(draft.lifecycle(), Lifecycle::Summary);
        assert!(draft.answers.is_empty());
    }
}
