use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use impact_core::{ImpactAnalysis, MAX_INPUT_CHARS, MIN_INPUT_CHARS};

use crate::auth::TokenProvider;
use crate::config::AssistConfig;
use crate::error::{AssistError, Result};

// ─── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    #[serde(rename = "freeText")]
    free_text: &'a str,
    #[serde(rename = "workspaceId")]
    workspace_id: &'a str,
}

/// Error body the service may attach to a non-2xx response. `code` is a
/// string in some paths and a bare number in others, so it is captured
/// loosely and normalized.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    code: Option<Value>,
}

impl ErrorBody {
    fn code_string(&self) -> Option<String> {
        match &self.code {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }
}

// ─── ImpactAssistClient ───────────────────────────────────────────────────

/// Client for the impact analysis service.
///
/// One outbound POST per [`ImpactAssistClient::analyze`] call; no internal
/// retries — retry is a caller-level action. Every failure path is
/// normalized into [`AssistError`] before returning, and successful bodies
/// pass through the sanitizer so callers only ever see a schema-valid
/// [`ImpactAnalysis`].
pub struct ImpactAssistClient {
    http: reqwest::Client,
    config: AssistConfig,
    tokens: Arc<dyn TokenProvider>,
}

impl std::fmt::Debug for ImpactAssistClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImpactAssistClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ImpactAssistClient {
    pub fn new(config: AssistConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self> {
        if config.endpoint.is_empty() {
            return Err(AssistError::Config(
                "analysis endpoint is not configured".to_string(),
            ));
        }
        if config.publishable_key.is_empty() {
            return Err(AssistError::Config(
                "publishable key is not configured".to_string(),
            ));
        }
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AssistError::Config(e.to_string()))?;
        Ok(ImpactAssistClient {
            http,
            config,
            tokens,
        })
    }

    /// Analyze free text about a decision and return the sanitized result.
    pub async fn analyze(&self, free_text: &str, workspace_id: &str) -> Result<ImpactAnalysis> {
        let chars = free_text.chars().count();
        if !(MIN_INPUT_CHARS..=MAX_INPUT_CHARS).contains(&chars) {
            return Err(AssistError::InvalidInput(format!(
                "free text must be between {MIN_INPUT_CHARS} and {MAX_INPUT_CHARS} characters (got {chars})"
            )));
        }
        if workspace_id.is_empty() {
            return Err(AssistError::InvalidInput(
                "workspace id is required".to_string(),
            ));
        }

        let token = self.tokens.fresh_token().await?;

        tracing::debug!(workspace_id, chars, "requesting impact analysis");
        let response = self
            .http
            .post(&self.config.endpoint)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.publishable_key),
            )
            .header("x-user-token", token)
            .json(&AnalyzeRequest {
                free_text,
                workspace_id,
            })
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let status = response.status();
        if !status.is_success() {
            let body: ErrorBody = response.json().await.unwrap_or_default();
            let code = body.code_string();
            let message = body
                .error
                .unwrap_or_else(|| format!("request failed with status {status}"));
            tracing::warn!(status = status.as_u16(), %message, "impact analysis request failed");
            return Err(AssistError::Service {
                status: Some(status.as_u16()),
                code,
                message,
            });
        }

        let raw: Value = response.json().await.map_err(|e| AssistError::Service {
            status: Some(status.as_u16()),
            code: Some("invalid_json".to_string()),
            message: e.to_string(),
        })?;
        Ok(ImpactAnalysis::from_untrusted(&raw))
    }

    fn map_transport(&self, e: reqwest::Error) -> AssistError {
        if e.is_timeout() {
            AssistError::Service {
                status: None,
                code: Some("timeout".to_string()),
                message: format!("analysis timed out after {:?}", self.config.timeout),
            }
        } else {
            AssistError::Service {
                status: None,
                code: None,
                message: e.to_string(),
            }
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    use crate::auth::StaticToken;

    fn client_for(url: String) -> ImpactAssistClient {
        let config = AssistConfig::new(url, "pk-test");
        ImpactAssistClient::new(config, Arc::new(StaticToken("user-token".into()))).unwrap()
    }

    const TEXT: &str = "We are moving from Slack to Microsoft Teams for all internal communication.";

    fn valid_body() -> Value {
        json!({
            "summary": "Decision: replace Slack with Microsoft Teams.",
            "ai_context": "Channels, integrations and retention settings change.",
            "clarifying_questions": ["Who owns the migration?", "When does Slack go read-only?"],
            "area_suggestions": {
                "asset_tools": "likely_impacted",
                "information_data": "to_review",
                "access_privileges": "to_review",
                "process_controls": "likely_impacted",
                "risk_impact": "not_sure",
                "policies_docs": "to_review",
                "people_awareness": "to_review",
            },
            "suggested_actions": [
                {"description": "Plan the data migration", "area_key": "information_data"},
            ],
        })
    }

    #[tokio::test]
    async fn analyze_success_returns_sanitized_analysis() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/functions/v1/impact-assist")
            .match_header("authorization", "Bearer pk-test")
            .match_header("x-user-token", "user-token")
            .match_body(mockito::Matcher::Json(json!({
                "freeText": TEXT,
                "workspaceId": "ws-1",
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(valid_body().to_string())
            .create_async()
            .await;

        let client = client_for(format!("{}/functions/v1/impact-assist", server.url()));
        let analysis = client.analyze(TEXT, "ws-1").await.unwrap();

        mock.assert_async().await;
        assert_eq!(
            analysis.summary,
            "Decision: replace Slack with Microsoft Teams."
        );
        assert_eq!(analysis.clarifying_questions.len(), 2);
    }

    #[tokio::test]
    async fn analyze_sanitizes_oversized_fields() {
        let mut server = mockito::Server::new_async().await;
        let body = json!({
            "summary": "s".repeat(500),
            "clarifying_questions": ["1", "2", "3", "4", "5", "6"],
        });
        server
            .mock("POST", "/analyze")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let client = client_for(format!("{}/analyze", server.url()));
        let analysis = client.analyze(TEXT, "ws-1").await.unwrap();
        assert_eq!(analysis.summary.chars().count(), 200);
        assert_eq!(analysis.clarifying_questions.len(), 4);
    }

    #[tokio::test]
    async fn analyze_maps_error_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/analyze")
            .with_status(502)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": "AI analysis failed", "code": "UPSTREAM"}"#)
            .create_async()
            .await;

        let client = client_for(format!("{}/analyze", server.url()));
        let err = client.analyze(TEXT, "ws-1").await.unwrap_err();
        match err {
            AssistError::Service {
                status,
                code,
                message,
            } => {
                assert_eq!(status, Some(502));
                assert_eq!(code.as_deref(), Some("UPSTREAM"));
                assert_eq!(message, "AI analysis failed");
            }
            other => panic!("expected Service error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn analyze_maps_numeric_error_code() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/analyze")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": "Missing user token", "code": 401}"#)
            .create_async()
            .await;

        let client = client_for(format!("{}/analyze", server.url()));
        let err = client.analyze(TEXT, "ws-1").await.unwrap_err();
        match err {
            AssistError::Service { status, code, .. } => {
                assert_eq!(status, Some(401));
                assert_eq!(code.as_deref(), Some("401"));
            }
            other => panic!("expected Service error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn analyze_error_without_body_uses_fallback_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/analyze")
            .with_status(500)
            .create_async()
            .await;

        let client = client_for(format!("{}/analyze", server.url()));
        let err = client.analyze(TEXT, "ws-1").await.unwrap_err();
        match err {
            AssistError::Service {
                status, message, ..
            } => {
                assert_eq!(status, Some(500));
                assert!(message.contains("500"));
            }
            other => panic!("expected Service error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn short_input_never_reaches_the_network() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/analyze")
            .expect(0)
            .create_async()
            .await;

        let client = client_for(format!("{}/analyze", server.url()));
        let err = client.analyze("too short", "ws-1").await.unwrap_err();
        assert!(matches!(err, AssistError::InvalidInput(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_workspace_id_is_invalid_input() {
        let client = client_for("http://127.0.0.1:1/analyze".to_string());
        let err = client.analyze(TEXT, "").await.unwrap_err();
        assert!(matches!(err, AssistError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn token_failure_maps_to_unauthorized() {
        struct NoSession;
        #[async_trait]
        impl TokenProvider for NoSession {
            async fn fresh_token(&self) -> Result<String> {
                Err(AssistError::Unauthorized("session expired".to_string()))
            }
        }

        let config = AssistConfig::new("http://127.0.0.1:1/analyze", "pk-test");
        let client = ImpactAssistClient::new(config, Arc::new(NoSession)).unwrap();
        let err = client.analyze(TEXT, "ws-1").await.unwrap_err();
        assert!(matches!(err, AssistError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn connection_failure_is_a_service_error_without_status() {
        // Port 1 is never listening.
        let client = client_for("http://127.0.0.1:1/analyze".to_string());
        let err = client.analyze(TEXT, "ws-1").await.unwrap_err();
        match err {
            AssistError::Service { status, .. } => assert_eq!(status, None),
            other => panic!("expected Service error, got {other:?}"),
        }
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn empty_config_is_rejected_at_construction() {
        let err = ImpactAssistClient::new(
            AssistConfig::new("", "pk-test"),
            Arc::new(StaticToken("t".into())),
        )
        .unwrap_err();
        assert!(matches!(err, AssistError::Config(_)));

        let err = ImpactAssistClient::new(
            AssistConfig::new("http://127.0.0.1:1/analyze", ""),
            Arc::new(StaticToken("t".into())),
        )
        .unwrap_err();
        assert!(matches!(err, AssistError::Config(_)));
    }
}
