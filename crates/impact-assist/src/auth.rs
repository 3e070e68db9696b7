use async_trait::async_trait;

use crate::error::Result;

/// Session/auth collaborator.
///
/// Implementations verify the current user and return a fresh session token
/// for an authenticated, workspace-member identity; they fail with
/// [`crate::AssistError::Unauthorized`] when there is no valid session.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn fresh_token(&self) -> Result<String>;
}

/// Fixed-token provider for tests and one-off tooling.
pub struct StaticToken(pub String);

#[async_trait]
impl TokenProvider for StaticToken {
    async fn fresh_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}
