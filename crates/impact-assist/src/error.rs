use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssistError {
    /// A local precondition was violated (text length, missing workspace
    /// id). Never produced by the network path.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No valid session. The caller must re-authenticate before retrying.
    #[error("not authenticated: {0}")]
    Unauthorized(String),

    /// Transport or backend failure, including timeouts. `status` is the
    /// remote HTTP status when a response was received at all.
    #[error("analysis service error: {message}")]
    Service {
        status: Option<u16>,
        code: Option<String>,
        message: String,
    },

    /// Missing or broken deployment configuration. Not recoverable by
    /// retrying the same call.
    #[error("configuration error: {0}")]
    Config(String),
}

impl AssistError {
    /// Whether re-issuing the same request can plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AssistError::Service { .. })
    }
}

pub type Result<T> = std::result::Result<T, AssistError>;
