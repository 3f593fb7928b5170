pub mod openai;
pub mod vision;

use async_trait::async_trait;
use thiserror::Error;

pub use openai::{ChatCompletionRequest, OpenAiCompatBackend};
pub use vision::{Diagnosis, VisionClient, NO_VALID_TEXT};

/// Why an outbound model call produced no usable text.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Authentication rejected ({status}): {body}")]
    Auth { status: u16, body: String },
    #[error("Rate limited by provider: {0}")]
    RateLimited(String),
    #[error("Model API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Malformed model response: {0}")]
    MalformedResponse(String),
    #[error("Model returned an empty response")]
    EmptyResponse,
    #[error("Failed to encode image for upload: {0}")]
    Encoding(String),
}

impl ModelError {
    /// Sorts a non-success HTTP status into the matching variant.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => Self::Auth { status, body },
            429 => Self::RateLimited(body),
            _ => Self::Api { status, body },
        }
    }
}

/// One chat-completion round trip. The HTTP implementation is
/// [`OpenAiCompatBackend`]; tests substitute canned replies.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, request: &ChatCompletionRequest) -> Result<String, ModelError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            ModelError::from_status(401, "bad key".into()),
            ModelError::Auth { status: 401, .. }
        ));
        assert!(matches!(
            ModelError::from_status(403, String::new()),
            ModelError::Auth { .. }
        ));
        assert!(matches!(
            ModelError::from_status(429, "slow down".into()),
            ModelError::RateLimited(_)
        ));
        assert!(matches!(
            ModelError::from_status(500, "boom".into()),
            ModelError::Api { status: 500, .. }
        ));
    }

    #[test]
    fn test_messages_carry_the_body() {
        let err = ModelError::from_status(502, "upstream down".into());
        assert_eq!(err.to_string(), "Model API error 502: upstream down");
    }
}
