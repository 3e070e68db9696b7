//! `impact-session` — the async driver for the New Decision flow.
//!
//! One spawned task per decision owns the draft and serializes every input:
//!
//! ```text
//! SessionHandle ── SessionCommand ──► DecisionSession task ──► SessionEvent
//!                                       │          │
//!                           AnalysisBackend    RevealEngine
//!                           (impact-assist)    (paced ChatEvents)
//!                                       │
//!                                  ImpactStore
//! ```
//!
//! The reveal engine paces the conversation ([`RevealConfig`]); the session
//! folds its events into lifecycle transitions on the
//! [`impact_core::DecisionDraft`] and forwards everything to the caller.
//! Cancellation is cooperative throughout: dropping the [`SessionHandle`]
//! tears down the task, any in-flight analysis call, and any running reveal.

pub mod reveal;
pub mod session;
pub mod store;
pub mod transcript;

pub use reveal::{AnswerCommand, ChatEvent, RevealConfig, RevealEngine, TurnKind};
pub use session::{
    AnalysisBackend, DecisionSession, SessionCommand, SessionEvent, SessionHandle,
};
pub use store::{workspace_accessible, ImpactStore, NewImpactRecord, StoreError, WorkspaceRef};
pub use transcript::{Transcript, TranscriptEntry};
