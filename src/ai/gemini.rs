/// Gemini REST client
///
/// Both collaborators go through the `generateContent` endpoint: the photo is
/// sent as an inline base64 part next to a text instruction. Captions read the
/// text parts of the first candidate; edits take its first inline image part.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::{CaptionService, ImageEditService, CAPTION_PROMPT, FALLBACK_EMPTY_CAPTION};
use crate::capture::CapturedImage;
use crate::config::AiConfig;
use crate::error::{Result, SnapError};

const API_KEY_HEADER: &str = "x-goog-api-key";

// ========== Wire types ==========

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    role: &'static str,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum RequestPart {
    InlineData(InlineData),
    Text(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<InlineData>,
}

impl GenerateContentResponse {
    fn first_parts(&self) -> &[ResponsePart] {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .unwrap_or_default()
    }

    /// Concatenated text of the first candidate
    fn text(&self) -> String {
        self.first_parts()
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect::<String>()
    }

    fn first_image(&self) -> Option<&InlineData> {
        self.first_parts().iter().find_map(|p| p.inline_data.as_ref())
    }
}

// ========== Client ==========

/// Caption and image-edit collaborator backed by the Gemini API
pub struct GeminiClient {
    client: Client,
    config: AiConfig,
}

impl GeminiClient {
    /// Build a client from configuration. A missing API key is not an error
    /// here; each call fails with `MissingApiKey` instead.
    pub fn new(config: &AiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| SnapError::ServiceError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key().is_ok()
    }

    fn api_key(&self) -> Result<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(SnapError::MissingApiKey)
    }

    fn url_for(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            model
        )
    }

    async fn generate(&self, model: &str, request: &GenerateContentRequest) -> Result<GenerateContentResponse> {
        let key = self.api_key()?;
        let url = self.url_for(model);
        let start = Instant::now();

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, key)
            .json(request)
            .send()
            .await
            .map_err(|e| SnapError::ServiceError(format!("request to {model} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(model, status = status.as_u16(), "generative service rejected request");
            return Err(SnapError::ServiceError(format!("HTTP {} from {model}: {body}", status.as_u16())));
        }

        let parsed = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| SnapError::ServiceError(format!("malformed response from {model}: {e}")))?;

        tracing::debug!(
            model,
            latency_ms = start.elapsed().as_millis() as u64,
            candidates = parsed.candidates.len(),
            "generative service responded"
        );
        Ok(parsed)
    }
}

fn photo_part(image: &CapturedImage) -> RequestPart {
    RequestPart::InlineData(InlineData {
        mime_type: image.mime_type().to_string(),
        data: image.base64_payload(),
    })
}

#[async_trait]
impl CaptionService for GeminiClient {
    async fn generate_caption(&self, image: &CapturedImage) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![photo_part(image), RequestPart::Text(CAPTION_PROMPT.to_string())],
            }],
            generation_config: Some(GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
            }),
        };

        let response = self.generate(&self.config.caption_model, &request).await?;
        let text = response.text();
        let caption = text.trim();
        if caption.is_empty() {
            tracing::info!("caption service returned no text, using fallback");
            return Ok(FALLBACK_EMPTY_CAPTION.to_string());
        }
        Ok(caption.to_string())
    }
}

#[async_trait]
impl ImageEditService for GeminiClient {
    async fn edit_image(&self, image: &CapturedImage, prompt: &str) -> Result<Option<CapturedImage>> {
        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![photo_part(image), RequestPart::Text(prompt.to_string())],
            }],
            generation_config: None,
        };

        let response = self.generate(&self.config.edit_model, &request).await?;
        let Some(inline) = response.first_image() else {
            tracing::info!("edit service returned no image part");
            return Ok(None);
        };

        let edited = CapturedImage::from_data_url(&inline.data)
            .map_err(|e| SnapError::ServiceError(format!("edit returned an unreadable image: {e}")))?;
        tracing::info!(
            mime = %inline.mime_type,
            width = edited.width(),
            height = edited.height(),
            "edit service returned image"
        );
        Ok(Some(edited))
    }
}
