//! Persistence seam for finished decisions.
//!
//! The session never talks to a database directly; it hands a fully shaped
//! [`NewImpactRecord`] to whatever [`ImpactStore`] the host wires in.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use impact_core::{AreaSuggestions, SuggestedAction};

#[derive(Debug, Error)]
#[error("store error: {0}")]
pub struct StoreError(pub String);

/// A workspace the current user belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceRef {
    pub id: String,
    pub name: String,
}

/// Everything needed to persist one decision. Built by the session from the
/// draft's sanitized analysis; answers stay in the conversation and are not
/// part of the stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewImpactRecord {
    pub workspace_id: String,
    /// Analysis summary, or the truncated original text when the flow ran
    /// without AI.
    pub title: String,
    pub context: String,
    pub area_states: AreaSuggestions,
    pub actions: Vec<SuggestedAction>,
    pub generated_by_ai: bool,
}

#[async_trait]
pub trait ImpactStore: Send + Sync {
    /// Workspaces the current user may create decisions in.
    async fn list_workspaces(&self) -> Result<Vec<WorkspaceRef>, StoreError>;

    /// Persist one decision and return its new id.
    async fn create_impact(&self, record: NewImpactRecord) -> Result<String, StoreError>;
}

/// True when the user is a member of `workspace_id`.
pub async fn workspace_accessible(
    store: &dyn ImpactStore,
    workspace_id: &str,
) -> Result<bool, StoreError> {
    let workspaces = store.list_workspaces().await?;
    Ok(workspaces.iter().any(|w| w.id == workspace_id))
}
