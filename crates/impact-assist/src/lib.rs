//! `impact-assist` — HTTP client for the impact analysis service.
//!
//! The service takes free text about an organizational decision and returns
//! a structured impact assessment. This crate owns the transport side of
//! that contract:
//!
//! ```text
//! AssistConfig + TokenProvider
//!     │
//!     ▼
//! ImpactAssistClient::analyze(text, workspace_id)
//!     │   POST { freeText, workspaceId }  (30s timeout, no retries)
//!     ▼
//! impact_core::ImpactAnalysis   ← sanitized; raw model output never escapes
//! ```
//!
//! Every failure is normalized into [`AssistError`] before it reaches the
//! caller: local precondition violations (`InvalidInput`), missing sessions
//! (`Unauthorized`), transport/backend failures including timeouts
//! (`Service`), and missing deployment configuration (`Config`).

pub mod auth;
pub mod client;
pub mod config;
pub mod error;

pub use auth::{StaticToken, TokenProvider};
pub use client::ImpactAssistClient;
pub use config::{AssistConfig, ANALYZE_TIMEOUT};
pub use error::{AssistError, Result};
