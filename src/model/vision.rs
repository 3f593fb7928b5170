use serde::Deserialize;
use std::sync::Arc;

use super::openai::{
    ChatCompletionRequest, ChatMessage, ContentPart, ImageUrl, JsonSchema, MessageContent,
    ResponseFormat,
};
use super::{ChatBackend, ModelError};
use crate::config::Config;
use crate::processing::bbox::{BoundingBox, BoxExtraction, extract_bounding_box};
use crate::processing::image::UploadedImage;
use crate::request_counter::RequestCounter;

pub const DIAGNOSIS_PROMPT: &str = "You are a plant disease expert assistant. If this image contains a plant, tree, or crop \
and shows signs of disease, describe the disease and identify the affected area. Provide \
the bounding box coordinates [x1, y1, x2, y2] around the diseased region. If no disease \
is visible, say so clearly. Only respond if the image is related to plants or crops.";

pub const NO_VALID_TEXT: &str = "No valid text provided for translation.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnosis {
    pub text: String,
    /// Set when the model answered in the structured schema; otherwise the box
    /// is searched for in `text`.
    pub structured_box: Option<BoxExtraction>,
}

impl Diagnosis {
    pub fn extraction(&self) -> BoxExtraction {
        match &self.structured_box {
            Some(extraction) => extraction.clone(),
            None => extract_bounding_box(&self.text),
        }
    }
}

#[derive(Debug, Deserialize)]
struct StructuredDiagnosis {
    description: String,
    bounding_box: Option<Vec<i64>>,
}

/// Issues the diagnosis and translation calls against one configured model.
#[derive(Clone)]
pub struct VisionClient {
    backend: Arc<dyn ChatBackend>,
    model: String,
    max_tokens: u32,
    structured_output: bool,
    request_counter: RequestCounter,
}

impl VisionClient {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        config: &Config,
        request_counter: RequestCounter,
    ) -> Self {
        Self {
            backend,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            structured_output: config.structured_output,
            request_counter,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One multimodal call; any failure is returned for the caller to abort on.
    pub async fn diagnose(&self, image: &UploadedImage) -> Result<Diagnosis, ModelError> {
        let image_url = image
            .data_url()
            .map_err(|e| ModelError::Encoding(e.to_string()))?;
        self.diagnose_data_url(image, image_url).await
    }

    /// Same as [`diagnose`](Self::diagnose) for callers that already hold the
    /// encoded data URL.
    pub async fn diagnose_data_url(
        &self,
        image: &UploadedImage,
        image_url: String,
    ) -> Result<Diagnosis, ModelError> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::user(MessageContent::Parts(vec![
                ContentPart::Text {
                    text: DIAGNOSIS_PROMPT.to_string(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl { url: image_url },
                },
            ]))],
            max_tokens: self.max_tokens,
            response_format: self.structured_output.then(diagnosis_schema),
        };

        self.request_counter.log_diagnosis_request(&format!(
            "{} | {}x{} {}",
            image.file_name,
            image.width(),
            image.height(),
            image.format
        ));

        let content = self.backend.complete(&request).await?;

        if self.structured_output {
            if let Some(diagnosis) = parse_structured(&content) {
                return Ok(diagnosis);
            }
            tracing::warn!("Structured diagnosis was not valid JSON, falling back to text parsing");
        }

        Ok(Diagnosis {
            text: content,
            structured_box: None,
        })
    }

    /// Never fails: blank input skips the call and errors become placeholder text.
    pub async fn translate(&self, text: &str, language: &str) -> String {
        if text.trim().is_empty() {
            return NO_VALID_TEXT.to_string();
        }

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(format!(
                    "You are a helpful translator. Translate the following text to {}. Keep plant and disease names accurate and preserve any bounding box coordinates as they are.",
                    language
                )),
                ChatMessage::user(MessageContent::Text(text.to_string())),
            ],
            max_tokens: self.max_tokens,
            response_format: None,
        };

        self.request_counter
            .log_translation_request(&format!("{} chars -> {}", text.chars().count(), language));

        match self.backend.complete(&request).await {
            Ok(translated) => translated,
            Err(e) => {
                tracing::warn!("Translation to {} failed: {}", language, e);
                format!("Translation failed: {}", e)
            }
        }
    }
}

fn diagnosis_schema() -> ResponseFormat {
    let schema = serde_json::json!({
        "type": "object",
        "properties": {
            "description": {
                "type": "string",
                "description": "Description of the plant disease, or a clear statement that none is visible."
            },
            "bounding_box": {
                "type": ["array", "null"],
                "items": { "type": "integer", "minimum": 0 },
                "minItems": 4,
                "maxItems": 4,
                "description": "[x1, y1, x2, y2] pixel coordinates of the diseased region, or null."
            }
        },
        "required": ["description", "bounding_box"],
        "additionalProperties": false
    });

    ResponseFormat {
        type_name: "json_schema".to_string(),
        json_schema: JsonSchema {
            name: "plant_diagnosis".to_string(),
            strict: true,
            schema,
        },
    }
}

fn parse_structured(content: &str) -> Option<Diagnosis> {
    let parsed: StructuredDiagnosis = serde_json::from_str(content).ok()?;

    let extraction = match parsed.bounding_box {
        None => BoxExtraction::NotFound,
        Some(coords) => match coords.as_slice() {
            [x1, y1, x2, y2] => {
                let to_coord = |v: &i64| i32::try_from(*v).ok().filter(|v| *v >= 0);
                match (to_coord(x1), to_coord(y1), to_coord(x2), to_coord(y2)) {
                    (Some(x1), Some(y1), Some(x2), Some(y2)) => {
                        BoxExtraction::Found(BoundingBox::new(x1, y1, x2, y2))
                    }
                    _ => BoxExtraction::Malformed(format!(
                        "coordinates {:?} are negative or out of range",
                        coords
                    )),
                }
            }
            _ => BoxExtraction::Malformed(format!(
                "expected four coordinates, got {}",
                coords.len()
            )),
        },
    };

    Some(Diagnosis {
        text: parsed.description.trim().to_string(),
        structured_box: Some(extraction),
    })
}
