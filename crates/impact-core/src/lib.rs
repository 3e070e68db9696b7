//! `impact-core` — domain model for the New Decision flow.
//!
//! This crate owns the pure, I/O-free logic of one in-progress decision:
//!
//! - the closed set of impact areas and suggestion levels ([`AreaKey`],
//!   [`SuggestionLevel`]),
//! - the sanitized AI analysis contract ([`ImpactAnalysis`]) and the total
//!   sanitizer that produces it from untrusted model output,
//! - the decision lifecycle state machine ([`DecisionDraft`]),
//! - the summary projection that groups areas and actions for display
//!   ([`SummaryView`]).
//!
//! Networking, timers, and persistence live in the `impact-assist` and
//! `impact-session` crates; everything here is synchronous and deterministic.

pub mod analysis;
pub mod area;
pub mod draft;
pub mod error;
pub mod projection;

pub use analysis::{
    AreaSuggestions, ImpactAnalysis, SuggestedAction, MAX_ACTIONS, MAX_ACTION_CHARS,
    MAX_CONTEXT_CHARS, MAX_QUESTIONS, MAX_SUMMARY_CHARS,
};
pub use area::{AnswerValue, AreaKey, SuggestionLevel};
pub use draft::{DecisionDraft, Lifecycle, MAX_INPUT_CHARS, MIN_INPUT_CHARS};
pub use error::{DecisionError, Result};
pub use projection::{project, ActionView, SummaryView, CROSS_AREA_LABEL};
