use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ChatBackend, ModelError};
use crate::config::Config;

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user(content: MessageContent) -> Self {
        Self {
            role: "user".to_string(),
            content,
        }
    }
}

/// Plain text for text-only turns, a part list for multimodal ones.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub type_name: String,
    pub json_schema: JsonSchema,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonSchema {
    pub name: String,
    pub strict: bool,
    pub schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    // OpenRouter reports some upstream failures with a 200 and an error object
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
    code: Option<serde_json::Value>,
}

/// Speaks the OpenAI chat-completions protocol to OpenRouter or any
/// compatible endpoint.
#[derive(Clone)]
pub struct OpenAiCompatBackend {
    http_client: reqwest::Client,
    url: String,
    api_key: String,
    referer: String,
    title: String,
}

impl OpenAiCompatBackend {
    pub fn new(http_client: reqwest::Client, config: &Config) -> Self {
        Self {
            http_client,
            url: config.chat_completions_url(),
            api_key: config.api_key.clone(),
            referer: config.referer.clone(),
            title: config.title.clone(),
        }
    }
}

#[async_trait]
impl ChatBackend for OpenAiCompatBackend {
    async fn complete(&self, request: &ChatCompletionRequest) -> Result<String, ModelError> {
        let res = self
            .http_client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(request)
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(ModelError::from_status(status.as_u16(), body));
        }

        parse_completion(&body)
    }
}

/// Pulls `choices[0].message.content` out of a successful response body.
pub fn parse_completion(body: &str) -> Result<String, ModelError> {
    let parsed: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| ModelError::MalformedResponse(format!("{} | body: {}", e, body)))?;

    if let Some(error) = parsed.error {
        let status = error
            .code
            .as_ref()
            .and_then(|c| c.as_u64())
            .and_then(|c| u16::try_from(c).ok())
            .unwrap_or(502);
        return Err(ModelError::from_status(status, error.message));
    }

    let content = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ModelError::MalformedResponse("response has no choices".to_string()))?
        .message
        .content
        .unwrap_or_default();

    let content = content.trim();
    if content.is_empty() {
        return Err(ModelError::EmptyResponse);
    }

    Ok(content.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_multimodal_request_wire_format() {
        let request = ChatCompletionRequest {
            model: "qwen/qwen2.5-vl-72b-instruct:free".to_string(),
            messages: vec![ChatMessage::user(MessageContent::Parts(vec![
                ContentPart::Text { text: "describe".to_string() },
                ContentPart::ImageUrl {
                    image_url: ImageUrl { url: "data:image/png;base64,AAAA".to_string() },
                },
            ]))],
            max_tokens: 300,
            response_format: None,
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "qwen/qwen2.5-vl-72b-instruct:free",
                "messages": [{
                    "role": "user",
                    "content": [
                        {"type": "text", "text": "describe"},
                        {"type": "image_url", "image_url": {"url": "data:image/png;base64,AAAA"}}
                    ]
                }],
                "max_tokens": 300
            })
        );
    }

    #[test]
    fn test_text_message_serializes_as_string() {
        let value = serde_json::to_value(ChatMessage::system("translate")).unwrap();
        assert_eq!(value, json!({"role": "system", "content": "translate"}));
    }

    #[test]
    fn test_parse_completion() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"  Leaf blight [1, 2, 3, 4]\n"}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "Leaf blight [1, 2, 3, 4]");
    }

    #[test]
    fn test_parse_completion_failures() {
        assert!(matches!(
            parse_completion("not json"),
            Err(ModelError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_completion(r#"{"choices":[]}"#),
            Err(ModelError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_completion(r#"{"choices":[{"message":{"content":null}}]}"#),
            Err(ModelError::EmptyResponse)
        ));
        assert!(matches!(
            parse_completion(r#"{"error":{"message":"Rate limit exceeded","code":429}}"#),
            Err(ModelError::RateLimited(_))
        ));
    }
}
