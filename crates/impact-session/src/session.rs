//! One running New Decision flow.
//!
//! [`DecisionSession::spawn`] starts a task that owns a [`DecisionDraft`]
//! and serializes everything that can touch it: user commands, the analysis
//! call and the reveal engine all funnel through one `select!` loop, so
//! state transitions happen in a single place and in a single order.

use std::ops::ControlFlow;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use impact_assist::ImpactAssistClient;
use impact_core::{
    AnswerValue, DecisionDraft, ImpactAnalysis, Lifecycle, MAX_SUMMARY_CHARS,
};

use crate::reveal::{AnswerCommand, ChatEvent, RevealConfig, RevealEngine};
use crate::store::{ImpactStore, NewImpactRecord};

// ─── Collaborators ────────────────────────────────────────────────────────

/// Analysis seam. The production implementation is
/// [`impact_assist::ImpactAssistClient`]; tests swap in scripted fakes.
#[async_trait::async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn analyze(
        &self,
        free_text: &str,
        workspace_id: &str,
    ) -> impact_assist::Result<ImpactAnalysis>;
}

#[async_trait::async_trait]
impl AnalysisBackend for impact_assist::ImpactAssistClient {
    async fn analyze(
        &self,
        free_text: &str,
        workspace_id: &str,
    ) -> impact_assist::Result<ImpactAnalysis> {
        ImpactAssistClient::analyze(self, free_text, workspace_id).await
    }
}

// ─── Commands and events ──────────────────────────────────────────────────

/// Everything a user can do to a running session.
#[derive(Debug, Clone)]
pub enum SessionCommand {
    /// Submit free text from the input step.
    Submit(String),
    /// Re-run analysis after a failure, with the same text.
    Retry,
    /// Leave the error step with a neutral analysis instead of retrying.
    ContinueWithoutAi,
    /// Answer the question currently awaiting input.
    Answer(AnswerValue),
    /// Resolve the current and all remaining questions as `not_sure`.
    SkipAll,
    /// One step backwards: processing/chat/error return to input (and
    /// discard the conversation), summary returns to chat.
    Back,
    /// One step forwards: chat (all questions answered) to summary, summary
    /// to creation.
    Proceed,
}

/// Everything the session reports back. Events arrive in the order the
/// underlying transitions happened.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Lifecycle(Lifecycle),
    Chat(ChatEvent),
    /// Analysis failed; the session is now at the error step.
    AnalysisFailed { message: String, retryable: bool },
    /// The decision was persisted; the session is finished.
    Created { impact_id: String },
    /// Persistence failed; the session is back at the summary step.
    CreateFailed { message: String },
    /// A command was not valid in the current step. State is unchanged.
    Rejected { reason: String },
}

// ─── Handle ───────────────────────────────────────────────────────────────

/// Caller-side handle to a spawned session.
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    events: mpsc::Receiver<SessionEvent>,
    cancel: CancellationToken,
}

impl SessionHandle {
    /// Send one command. Returns false once the session has ended.
    pub async fn send(&self, command: SessionCommand) -> bool {
        self.commands.send(command).await.is_ok()
    }

    /// Next event, or `None` once the session has ended.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }

    /// Tear the session down without finishing the flow.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ─── Session ──────────────────────────────────────────────────────────────

pub struct DecisionSession;

impl DecisionSession {
    /// Start a session for one decision in `workspace_id`. The returned
    /// handle is the only way in or out; dropping it tears the task down.
    pub fn spawn(
        workspace_id: impl Into<String>,
        backend: Arc<dyn AnalysisBackend>,
        store: Arc<dyn ImpactStore>,
        reveal: RevealConfig,
    ) -> SessionHandle {
        let (command_tx, command_rx) = mpsc::channel(16);
        let (event_tx, event_rx) = mpsc::channel(256);
        let cancel = CancellationToken::new();

        let task = SessionTask {
            draft: DecisionDraft::new(workspace_id),
            backend,
            store,
            reveal,
            events: event_tx,
        };
        tokio::spawn(task.run(command_rx, cancel.clone()));

        SessionHandle {
            commands: command_tx,
            events: event_rx,
            cancel,
        }
    }
}

struct PendingAnalysis {
    generation: u64,
    handle: JoinHandle<impact_assist::Result<ImpactAnalysis>>,
}

struct ChatLink {
    answers: mpsc::Sender<AnswerCommand>,
    events: mpsc::Receiver<ChatEvent>,
    cancel: CancellationToken,
}

impl Drop for ChatLink {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct SessionTask {
    draft: DecisionDraft,
    backend: Arc<dyn AnalysisBackend>,
    store: Arc<dyn ImpactStore>,
    reveal: RevealConfig,
    events: mpsc::Sender<SessionEvent>,
}

impl SessionTask {
    async fn run(mut self, mut commands: mpsc::Receiver<SessionCommand>, cancel: CancellationToken) {
        let mut pending: Option<PendingAnalysis> = None;
        let mut chat: Option<ChatLink> = None;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(draft = %self.draft.id, "session cancelled");
                    break;
                }
                command = commands.recv() => {
                    let Some(command) = command else { break };
                    if let ControlFlow::Break(()) =
                        self.handle_command(command, &mut pending, &mut chat).await
                    {
                        break;
                    }
                }
                joined = async { (&mut pending.as_mut().unwrap().handle).await },
                    if pending.is_some() =>
                {
                    let PendingAnalysis { generation, .. } = pending.take().unwrap();
                    self.on_analysis_result(generation, joined, &mut chat).await;
                }
                event = async { chat.as_mut().unwrap().events.recv().await },
                    if chat.is_some() =>
                {
                    match event {
                        Some(event) => self.on_chat_event(event, &mut chat).await,
                        None => chat = None,
                    }
                }
            }
        }

        if let Some(p) = pending.take() {
            p.handle.abort();
        }
    }

    async fn handle_command(
        &mut self,
        command: SessionCommand,
        pending: &mut Option<PendingAnalysis>,
        chat: &mut Option<ChatLink>,
    ) -> ControlFlow<()> {
        match command {
            SessionCommand::Submit(text) => match self.draft.submit(&text) {
                Ok(true) => {
                    self.emit_lifecycle().await;
                    *pending = Some(self.start_analysis());
                }
                Ok(false) => {
                    self.reject("free text must be between 10 and 5000 characters")
                        .await;
                }
                Err(e) => self.reject(&e.to_string()).await,
            },
            SessionCommand::Retry => match self.draft.retry() {
                Ok(()) => {
                    self.emit_lifecycle().await;
                    *pending = Some(self.start_analysis());
                }
                Err(e) => self.reject(&e.to_string()).await,
            },
            SessionCommand::ContinueWithoutAi => match self.draft.continue_without_ai() {
                Ok(()) => self.emit_lifecycle().await,
                Err(e) => self.reject(&e.to_string()).await,
            },
            SessionCommand::Answer(answer) => {
                self.forward_answer(AnswerCommand::Answer(answer), chat).await;
            }
            SessionCommand::SkipAll => {
                self.forward_answer(AnswerCommand::SkipAll, chat).await;
            }
            SessionCommand::Back => match self.draft.lifecycle() {
                Lifecycle::Processing => {
                    if let Some(p) = pending.take() {
                        p.handle.abort();
                    }
                    self.back_to_input(chat).await;
                }
                Lifecycle::Chat | Lifecycle::Error => self.back_to_input(chat).await,
                Lifecycle::Summary => match self.draft.back_to_chat() {
                    Ok(()) => self.emit_lifecycle().await,
                    Err(e) => self.reject(&e.to_string()).await,
                },
                _ => {
                    self.reject("nothing to go back to from this step").await;
                }
            },
            SessionCommand::Proceed => match self.draft.lifecycle() {
                Lifecycle::Chat => {
                    if chat.is_some() {
                        self.reject("answer the remaining questions or skip them")
                            .await;
                    } else {
                        match self.draft.complete_chat() {
                            Ok(()) => self.emit_lifecycle().await,
                            Err(e) => self.reject(&e.to_string()).await,
                        }
                    }
                }
                Lifecycle::Summary => return self.create(chat).await,
                _ => self.reject("nothing to proceed to from this step").await,
            },
        }
        ControlFlow::Continue(())
    }

    fn start_analysis(&self) -> PendingAnalysis {
        let backend = Arc::clone(&self.backend);
        let text = self.draft.original_text.clone();
        let workspace_id = self.draft.workspace_id.clone();
        PendingAnalysis {
            generation: self.draft.generation(),
            handle: tokio::spawn(async move { backend.analyze(&text, &workspace_id).await }),
        }
    }

    async fn on_analysis_result(
        &mut self,
        generation: u64,
        joined: Result<impact_assist::Result<ImpactAnalysis>, tokio::task::JoinError>,
        chat: &mut Option<ChatLink>,
    ) {
        let outcome = match joined {
            Ok(outcome) => outcome,
            Err(join_error) => Err(impact_assist::AssistError::Service {
                status: None,
                code: None,
                message: join_error.to_string(),
            }),
        };
        match outcome {
            Ok(analysis) => {
                if self.draft.apply_analysis(generation, analysis) {
                    self.emit_lifecycle().await;
                    *chat = Some(self.start_chat());
                } else {
                    tracing::debug!(draft = %self.draft.id, "discarding stale analysis response");
                }
            }
            Err(e) => {
                if self.draft.fail_analysis(generation) {
                    tracing::warn!(draft = %self.draft.id, error = %e, "analysis failed");
                    self.emit_lifecycle().await;
                    self.emit(SessionEvent::AnalysisFailed {
                        message: e.to_string(),
                        retryable: e.is_retryable(),
                    })
                    .await;
                } else {
                    tracing::debug!(draft = %self.draft.id, "discarding stale analysis failure");
                }
            }
        }
    }

    fn start_chat(&self) -> ChatLink {
        let (event_tx, event_rx) = mpsc::channel(1024);
        let (answer_tx, answer_rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let engine = RevealEngine::new(self.reveal.clone(), event_tx, answer_rx, cancel.clone());
        let analysis = self
            .draft
            .analysis
            .clone()
            .unwrap_or_else(ImpactAnalysis::neutral);
        tokio::spawn(async move {
            engine.run(&analysis).await;
        });
        ChatLink {
            answers: answer_tx,
            events: event_rx,
            cancel,
        }
    }

    async fn on_chat_event(&mut self, event: ChatEvent, chat: &mut Option<ChatLink>) {
        match &event {
            ChatEvent::AnswerRecorded {
                question_index,
                answer,
            } => {
                if let Err(e) = self.draft.record_answer(*question_index, answer.clone()) {
                    tracing::warn!(draft = %self.draft.id, error = %e, "answer out of range");
                }
            }
            ChatEvent::Finished { .. } => {
                self.emit(SessionEvent::Chat(event.clone())).await;
                *chat = None;
                match self.draft.complete_chat() {
                    Ok(()) => self.emit_lifecycle().await,
                    Err(e) => {
                        tracing::warn!(draft = %self.draft.id, error = %e, "could not complete chat");
                    }
                }
                return;
            }
            _ => {}
        }
        self.emit(SessionEvent::Chat(event)).await;
    }

    async fn forward_answer(&mut self, command: AnswerCommand, chat: &mut Option<ChatLink>) {
        match chat {
            Some(link) => {
                if link.answers.send(command).await.is_err() {
                    self.reject("the conversation is no longer accepting answers")
                        .await;
                }
            }
            None => self.reject("no question is awaiting an answer").await,
        }
    }

    async fn back_to_input(&mut self, chat: &mut Option<ChatLink>) {
        // Dropping the link cancels the reveal engine.
        *chat = None;
        match self.draft.back_to_input() {
            Ok(()) => self.emit_lifecycle().await,
            Err(e) => self.reject(&e.to_string()).await,
        }
    }

    async fn create(&mut self, chat: &mut Option<ChatLink>) -> ControlFlow<()> {
        if let Err(e) = self.draft.begin_create() {
            self.reject(&e.to_string()).await;
            return ControlFlow::Continue(());
        }
        self.emit_lifecycle().await;
        *chat = None;

        let record = self.build_record();
        match self.store.create_impact(record).await {
            Ok(impact_id) => {
                tracing::info!(draft = %self.draft.id, %impact_id, "decision created");
                self.emit(SessionEvent::Created { impact_id }).await;
                ControlFlow::Break(())
            }
            Err(e) => {
                tracing::warn!(draft = %self.draft.id, error = %e, "create failed");
                if let Err(transition) = self.draft.create_failed() {
                    tracing::warn!(draft = %self.draft.id, error = %transition, "could not return to summary");
                }
                self.emit_lifecycle().await;
                self.emit(SessionEvent::CreateFailed {
                    message: e.to_string(),
                })
                .await;
                ControlFlow::Continue(())
            }
        }
    }

    fn build_record(&self) -> NewImpactRecord {
        let analysis = self
            .draft
            .analysis
            .clone()
            .unwrap_or_else(ImpactAnalysis::neutral);
        let title = if analysis.summary.is_empty() {
            self.draft
                .original_text
                .chars()
                .take(MAX_SUMMARY_CHARS)
                .collect()
        } else {
            analysis.summary.clone()
        };
        NewImpactRecord {
            workspace_id: self.draft.workspace_id.clone(),
            title,
            context: analysis.context,
            area_states: analysis.area_suggestions,
            actions: analysis.suggested_actions,
            generated_by_ai: self.draft.ai_generated,
        }
    }

    async fn emit_lifecycle(&self) {
        let state = self.draft.lifecycle();
        tracing::info!(draft = %self.draft.id, state = %state, "decision step");
        self.emit(SessionEvent::Lifecycle(state)).await;
    }

    async fn reject(&self, reason: &str) {
        tracing::debug!(draft = %self.draft.id, reason, "command rejected");
        self.emit(SessionEvent::Rejected {
            reason: reason.to_string(),
        })
        .await;
    }

    async fn emit(&self, event: SessionEvent) {
        // A dropped handle cancels the token; loose sends can be ignored.
        let _ = self.events.send(event).await;
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
