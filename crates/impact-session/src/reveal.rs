//! Conversational reveal of an analysis result.
//!
//! The engine walks one [`ImpactAnalysis`] through a fixed sequence of turns
//! (intro, context, one turn per clarifying question) and emits a stream of
//! [`ChatEvent`]s a UI can render verbatim. All pacing comes from
//! [`RevealConfig`]; tests run with [`RevealConfig::instant`].

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use impact_core::{AnswerValue, ImpactAnalysis};

// ─── Pacing ───────────────────────────────────────────────────────────────

/// Reveal pacing. Defaults match the product's conversational rhythm.
#[derive(Debug, Clone)]
pub struct RevealConfig {
    /// Per-character delay for the intro and question turns.
    pub char_interval: Duration,
    /// Per-character delay for the context turn.
    pub context_char_interval: Duration,
    /// Pause after the intro finishes revealing.
    pub intro_settle: Duration,
    /// Pause after the context finishes revealing.
    pub context_settle: Duration,
    /// Pause between an answer and the thinking indicator.
    pub answer_ack: Duration,
    /// How long the thinking indicator shows between questions.
    pub thinking: Duration,
    /// Thinking time after the last answer, before finishing.
    pub final_thinking: Duration,
    /// The context turn reveals at most this many characters; the full text
    /// still travels in [`ChatEvent::MessageStarted`] for expansion.
    pub context_preview_chars: usize,
}

impl Default for RevealConfig {
    fn default() -> Self {
        RevealConfig {
            char_interval: Duration::from_millis(15),
            context_char_interval: Duration::from_millis(12),
            intro_settle: Duration::from_millis(600),
            context_settle: Duration::from_millis(800),
            answer_ack: Duration::from_millis(300),
            thinking: Duration::from_millis(800),
            final_thinking: Duration::from_millis(1000),
            context_preview_chars: 150,
        }
    }
}

impl RevealConfig {
    /// Zero-delay pacing. Event order is identical to the default profile.
    pub fn instant() -> Self {
        RevealConfig {
            char_interval: Duration::ZERO,
            context_char_interval: Duration::ZERO,
            intro_settle: Duration::ZERO,
            context_settle: Duration::ZERO,
            answer_ack: Duration::ZERO,
            thinking: Duration::ZERO,
            final_thinking: Duration::ZERO,
            context_preview_chars: 150,
        }
    }
}

// ─── Events ───────────────────────────────────────────────────────────────

/// Which turn a chat message belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnKind {
    Intro,
    Context,
    Question { index: usize, total: usize },
}

/// One step of the conversation, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// A new assistant message entered the log. `text` is the complete
    /// content; the reveal that follows only controls how much is visible.
    MessageStarted { kind: TurnKind, text: String },
    /// The first `revealed` characters of the current message are visible.
    RevealProgress { revealed: usize },
    MessageCompleted,
    /// Thinking indicator between an answer and the next turn.
    Thinking,
    /// The engine is blocked until an [`AnswerCommand`] arrives.
    AwaitingAnswer { question_index: usize, total: usize },
    /// An answer was committed to the draft's log.
    AnswerRecorded {
        question_index: usize,
        answer: AnswerValue,
    },
    /// All questions resolved; the session moves on to the summary.
    Finished {
        answers: BTreeMap<usize, AnswerValue>,
    },
}

/// User input consumed while a question is awaiting an answer.
#[derive(Debug, Clone)]
pub enum AnswerCommand {
    Answer(AnswerValue),
    /// Resolve the current and all remaining questions as `not_sure`.
    SkipAll,
}

// ─── Engine ───────────────────────────────────────────────────────────────

/// Drives one analysis through the reveal sequence.
///
/// The engine is single-pass and owns its channels: events come out strictly
/// in conversation order, answers are consumed one per question. Cancelling
/// the token stops it at the next await point without emitting anything
/// further.
pub struct RevealEngine {
    config: RevealConfig,
    events: mpsc::Sender<ChatEvent>,
    answers: mpsc::Receiver<AnswerCommand>,
    cancel: CancellationToken,
}

impl RevealEngine {
    pub fn new(
        config: RevealConfig,
        events: mpsc::Sender<ChatEvent>,
        answers: mpsc::Receiver<AnswerCommand>,
        cancel: CancellationToken,
    ) -> Self {
        RevealEngine {
            config,
            events,
            answers,
            cancel,
        }
    }

    /// Run the full sequence. Returns the collected answers, or `None` when
    /// cancelled or when the event receiver went away.
    pub async fn run(mut self, analysis: &ImpactAnalysis) -> Option<BTreeMap<usize, AnswerValue>> {
        let intro_chars = analysis.summary.chars().count();
        self.message(
            TurnKind::Intro,
            &analysis.summary,
            intro_chars,
            self.config.char_interval,
        )
        .await?;
        self.sleep(self.config.intro_settle).await?;

        let context_chars = analysis.context.chars().count();
        let preview = context_chars.min(self.config.context_preview_chars);
        self.message(
            TurnKind::Context,
            &analysis.context,
            preview,
            self.config.context_char_interval,
        )
        .await?;
        self.sleep(self.config.context_settle).await?;

        let total = analysis.clarifying_questions.len();
        let mut answers = BTreeMap::new();
        for (index, question) in analysis.clarifying_questions.iter().enumerate() {
            self.message(
                TurnKind::Question { index, total },
                question,
                question.chars().count(),
                self.config.char_interval,
            )
            .await?;
            self.send(ChatEvent::AwaitingAnswer {
                question_index: index,
                total,
            })
            .await?;

            match self.next_command().await? {
                AnswerCommand::Answer(answer) => {
                    answers.insert(index, answer.clone());
                    self.send(ChatEvent::AnswerRecorded {
                        question_index: index,
                        answer,
                    })
                    .await?;
                    if index + 1 < total {
                        self.sleep(self.config.answer_ack).await?;
                        self.send(ChatEvent::Thinking).await?;
                        self.sleep(self.config.thinking).await?;
                    } else {
                        self.send(ChatEvent::Thinking).await?;
                        self.sleep(self.config.final_thinking).await?;
                    }
                }
                AnswerCommand::SkipAll => {
                    for skipped in index..total {
                        answers.insert(skipped, AnswerValue::NotSure);
                        self.send(ChatEvent::AnswerRecorded {
                            question_index: skipped,
                            answer: AnswerValue::NotSure,
                        })
                        .await?;
                    }
                    break;
                }
            }
        }

        self.send(ChatEvent::Finished {
            answers: answers.clone(),
        })
        .await?;
        Some(answers)
    }

    async fn message(
        &mut self,
        kind: TurnKind,
        text: &str,
        reveal_chars: usize,
        interval: Duration,
    ) -> Option<()> {
        self.send(ChatEvent::MessageStarted {
            kind,
            text: text.to_string(),
        })
        .await?;
        for revealed in 1..=reveal_chars {
            self.sleep(interval).await?;
            self.send(ChatEvent::RevealProgress { revealed }).await?;
        }
        self.send(ChatEvent::MessageCompleted).await
    }

    async fn sleep(&mut self, duration: Duration) -> Option<()> {
        if duration.is_zero() {
            return Some(());
        }
        tokio::select! {
            _ = self.cancel.cancelled() => None,
            _ = tokio::time::sleep(duration) => Some(()),
        }
    }

    async fn send(&mut self, event: ChatEvent) -> Option<()> {
        tokio::select! {
            _ = self.cancel.cancelled() => None,
            sent = self.events.send(event) => sent.ok(),
        }
    }

    async fn next_command(&mut self) -> Option<AnswerCommand> {
        tokio::select! {
            _ = self.cancel.cancelled() => None,
            command = self.answers.recv() => command,
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
