// ABOUTME: Image analysis through an OpenAI-compatible chat completions endpoint
// ABOUTME: First classifies an image as item or container, then extracts structured metadata

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::Config;
use crate::entities::image::ImageType;
use crate::error::{AppError, Result};
use crate::metadata::{AnalysisResult, CategoryLibrary, ContainerImageMetadata, ItemImageMetadata};

/// Image bytes plus the content type needed to build a data URL.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    pub fn data_url(&self) -> String {
        let content_type = if self.content_type.is_empty() {
            "image/jpeg"
        } else {
            self.content_type.as_str()
        };
        format!("data:{};base64,{}", content_type, STANDARD.encode(&self.bytes))
    }
}

#[async_trait]
pub trait ImageAnalyzer: Send + Sync {
    async fn analyze(&self, image: &ImagePayload, categories: &CategoryLibrary) -> Result<AnalysisResult>;
}

const CLASSIFY_PROMPT: &str = "Decide whether this photo shows one inventory item on its own, \
or a container (box, bin, drawer, shelf) holding several items. \
Reply with JSON: {\"type\": \"item\"} or {\"type\": \"container\"}.";

const ITEM_SHAPE: &str = r#"{
  "image_label": string,
  "image_notes": string,
  "item": {
    "item_label": string,
    "item_notes": string,
    "category_functional": string,
    "category_specific": string,
    "item_type": string,
    "item_manufacturer": string,
    "item_attributes": [{"name": string, "value": string}]
  }
}"#;

const CONTAINER_SHAPE: &str = r#"{
  "image_label": string,
  "image_notes": string,
  "container": {
    "container_label": string,
    "container_notes": string,
    "container_items": [ { same fields as an item: item_label, item_notes, category_functional, category_specific, item_type, item_manufacturer, item_attributes } ]
  }
}"#;

#[derive(Debug, Deserialize)]
struct Classification {
    #[serde(rename = "type")]
    kind: ImageType,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    response_format: Value,
    messages: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

pub struct OpenAiAnalyzer {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiAnalyzer {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
            model,
        }
    }

    /// `None` when no API key is configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        config.openai_api_key.as_ref().map(|key| {
            Self::new(
                key.clone(),
                config.openai_base_url.clone(),
                config.openai_model.clone(),
            )
        })
    }

    async fn complete<T: DeserializeOwned>(&self, prompt: &str, image: &ImagePayload) -> Result<T> {
        let request = ChatRequest {
            model: &self.model,
            response_format: json!({ "type": "json_object" }),
            messages: vec![json!({
                "role": "user",
                "content": [
                    { "type": "text", "text": prompt },
                    { "type": "image_url", "image_url": { "url": image.data_url() } },
                ],
            })],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "Analyzer returned {}: {}",
                status, body
            )));
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::ExternalService("Analyzer returned no content".to_string()))?;

        serde_json::from_str(&content).map_err(|e| {
            AppError::ExternalService(format!("Analyzer returned malformed JSON: {}", e))
        })
    }

    async fn classify(&self, image: &ImagePayload) -> Result<ImageType> {
        let classification: Classification = self.complete(CLASSIFY_PROMPT, image).await?;
        match classification.kind {
            ImageType::Unprocessed => Err(AppError::ExternalService(
                "Analyzer could not classify the image".to_string(),
            )),
            kind => Ok(kind),
        }
    }
}

#[async_trait]
impl ImageAnalyzer for OpenAiAnalyzer {
    async fn analyze(&self, image: &ImagePayload, categories: &CategoryLibrary) -> Result<AnalysisResult> {
        let kind = self.classify(image).await?;
        tracing::debug!(?kind, "Classified image");

        let context = categories.prompt_context();

        if kind == ImageType::Item {
            let prompt = format!(
                "Analyze this photo of a single inventory item. Extract its label, notes, \
                 categories, manufacturer and attributes such as dimensions, ratings, \
                 quantities or colors.\n\n{}\n\nReply with JSON shaped like:\n{}",
                context, ITEM_SHAPE
            );
            let data: ItemImageMetadata = self.complete(&prompt, image).await?;
            Ok(AnalysisResult::Item(data))
        } else {
            let prompt = format!(
                "Analyze this photo of a container holding several items. Describe the \
                 container and give full metadata for every visible item inside it.\n\n{}\n\n\
                 Reply with JSON shaped like:\n{}",
                context, CONTAINER_SHAPE
            );
            let data: ContainerImageMetadata = self.complete(&prompt, image).await?;
            Ok(AnalysisResult::Container(data))
        }
    }
}
