use std::time::Duration;

use crate::error::{AssistError, Result};

/// Upper bound on one analysis call. Exceeding it is treated as a transport
/// failure.
pub const ANALYZE_TIMEOUT: Duration = Duration::from_secs(30);

/// Deployment configuration for the analysis service.
///
/// Built once and injected into [`crate::ImpactAssistClient`] at
/// construction — never read ambiently mid-call, so a client can run against
/// fake configuration in tests.
#[derive(Debug, Clone)]
pub struct AssistConfig {
    /// Full URL of the analysis endpoint.
    pub endpoint: String,
    /// Publishable key sent as the `Authorization` bearer. The per-user
    /// session token travels separately (`x-user-token`).
    pub publishable_key: String,
    pub timeout: Duration,
}

impl AssistConfig {
    pub fn new(endpoint: impl Into<String>, publishable_key: impl Into<String>) -> Self {
        AssistConfig {
            endpoint: endpoint.into(),
            publishable_key: publishable_key.into(),
            timeout: ANALYZE_TIMEOUT,
        }
    }

    /// Read configuration from the process environment at construction time.
    pub fn from_env() -> Result<Self> {
        let endpoint = std::env::var("IMPACT_ASSIST_ENDPOINT")
            .map_err(|_| AssistError::Config("IMPACT_ASSIST_ENDPOINT is not set".to_string()))?;
        let publishable_key = std::env::var("IMPACT_ASSIST_KEY")
            .map_err(|_| AssistError::Config("IMPACT_ASSIST_KEY is not set".to_string()))?;
        Ok(AssistConfig::new(endpoint, publishable_key))
    }
}
