//! Ordered chat log built from [`ChatEvent`]s.
//!
//! The session emits events; a UI that wants a message list (rather than a
//! raw event stream) folds them through [`Transcript::apply`]. Going back to
//! the input step truncates the log via [`Transcript::clear`].

use impact_core::AnswerValue;

use crate::reveal::{ChatEvent, TurnKind};

/// One entry in the visible conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptEntry {
    Assistant { kind: TurnKind, text: String },
    User {
        question_index: usize,
        answer: AnswerValue,
    },
}

/// Append-only message log; entries appear in reveal order and interleave
/// assistant turns with the user's answers.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Transcript::default()
    }

    /// Fold one chat event into the log. Progress, thinking and lifecycle
    /// events do not create entries.
    pub fn apply(&mut self, event: &ChatEvent) {
        match event {
            ChatEvent::MessageStarted { kind, text } => {
                self.entries.push(TranscriptEntry::Assistant {
                    kind: kind.clone(),
                    text: text.clone(),
                });
            }
            ChatEvent::AnswerRecorded {
                question_index,
                answer,
            } => {
                self.entries.push(TranscriptEntry::User {
                    question_index: *question_index,
                    answer: answer.clone(),
                });
            }
            _ => {}
        }
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop everything. Used when the flow returns to the input step; a
    /// resubmission starts a fresh conversation.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
