//! Gemini (Google) implementation of [`GenAiClient`].

use crate::chat::Message;
use crate::config::StudioConfig;
use crate::error::{parse_retry_after, sanitize_error_message, Result, StudioError};
use crate::genai::client::GenAiClient;
use crate::image::ImageAsset;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Instant;

/// Finish reasons that mean the model refused on safety grounds.
const BLOCKING_FINISH_REASONS: [&str; 7] = [
    "SAFETY",
    "IMAGE_SAFETY",
    "IMAGE_PROHIBITED_CONTENT",
    "IMAGE_RECITATION",
    "RECITATION",
    "PROHIBITED_CONTENT",
    "BLOCKLIST",
];

/// Gemini `generateContent` client.
pub struct GeminiClient {
    client: reqwest::Client,
    config: StudioConfig,
}

impl GeminiClient {
    /// Creates a client from an explicit configuration.
    pub fn new(config: StudioConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Creates a client from the environment, failing fast without a key.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(StudioConfig::from_env()?))
    }

    /// Returns the configuration this client was built with.
    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    fn model_url(&self, model: &str) -> String {
        format!("{}/models/{}", self.config.base_url, model)
    }

    async fn generate_content<T: DeserializeOwned>(
        &self,
        model: &str,
        body: &GeminiRequest,
    ) -> Result<T> {
        let url = format!("{}:generateContent", self.model_url(model));

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(self.parse_error(status.as_u16(), &text, &headers));
        }

        Ok(response.json().await?)
    }

    fn parse_error(
        &self,
        status: u16,
        text: &str,
        headers: &reqwest::header::HeaderMap,
    ) -> StudioError {
        let message = serde_json::from_str::<GeminiErrorBody>(text)
            .map(|body| body.error.message)
            .unwrap_or_else(|_| text.to_string());
        let message = sanitize_error_message(&message, &self.config.api_key);

        match status {
            401 | 403 => StudioError::Auth(message),
            404 => StudioError::Api {
                status,
                message: "Model not found. Verify the model name is correct.".into(),
            },
            429 => StudioError::RateLimited {
                retry_after: parse_retry_after(headers).map(std::time::Duration::from_secs),
            },
            _ => StudioError::Api { status, message },
        }
    }
}

#[async_trait]
impl GenAiClient for GeminiClient {
    async fn request_image_edit(
        &self,
        image_base64: &str,
        mime_type: &str,
        prompt: &str,
    ) -> Result<Option<ImageAsset>> {
        let start = Instant::now();
        let model = self.config.image_model.as_str();
        tracing::debug!(model, mime_type, prompt_len = prompt.len(), "sending image edit request");

        let body = GeminiRequest::image_edit(image_base64, mime_type, prompt);
        let response: GeminiResponse = self.generate_content(model, &body).await?;
        let image = response.into_first_image()?;

        tracing::debug!(
            model,
            has_image = image.is_some(),
            duration_ms = start.elapsed().as_millis() as u64,
            "image edit complete"
        );
        Ok(image)
    }

    async fn request_chat_reply(&self, history: &[Message], message: &str) -> Result<String> {
        let start = Instant::now();
        let model = self.config.chat_model.as_str();
        tracing::debug!(model, history_len = history.len(), "sending chat request");

        let body = GeminiRequest::chat(history, message, &self.config.system_instruction);
        let response: GeminiResponse = self.generate_content(model, &body).await?;
        let reply = response.into_text()?;

        tracing::debug!(
            model,
            reply_len = reply.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "chat reply received"
        );
        Ok(reply)
    }

    fn name(&self) -> &str {
        "Gemini (Google)"
    }

    async fn health_check(&self) -> Result<()> {
        let response = self
            .client
            .get(self.model_url(&self.config.chat_model))
            .header("x-goog-api-key", &self.config.api_key)
            .send()
            .await?;

        match response.status().as_u16() {
            401 | 403 => Err(StudioError::Auth("Invalid API key".into())),
            404 => Err(StudioError::Api {
                status: 404,
                message: "Model not found. Verify the model name is correct.".into(),
            }),
            s if !(200..300).contains(&s) => Err(StudioError::Api {
                status: s,
                message: "Health check failed".into(),
            }),
            _ => Ok(()),
        }
    }
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiConfig>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<GeminiRequestPart>,
}

/// A part in a Gemini request - can be text or inline image data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    response_modalities: Vec<String>,
}

impl GeminiRequest {
    fn image_edit(image_base64: &str, mime_type: &str, prompt: &str) -> Self {
        let parts = vec![
            GeminiRequestPart::InlineData {
                inline_data: InlineData {
                    mime_type: mime_type.to_string(),
                    data: image_base64.to_string(),
                },
            },
            GeminiRequestPart::Text {
                text: prompt.to_string(),
            },
        ];

        Self {
            contents: vec![GeminiContent { role: None, parts }],
            system_instruction: None,
            generation_config: Some(GeminiConfig {
                response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
            }),
        }
    }

    fn chat(history: &[Message], message: &str, system_instruction: &str) -> Self {
        let text_content = |role, text: &str| GeminiContent {
            role: Some(role),
            parts: vec![GeminiRequestPart::Text {
                text: text.to_string(),
            }],
        };

        let mut contents: Vec<GeminiContent> = history
            .iter()
            .map(|m| text_content(m.role().as_str(), m.text()))
            .collect();
        contents.push(text_content("user", message));

        Self {
            contents,
            system_instruction: Some(GeminiContent {
                role: None,
                parts: vec![GeminiRequestPart::Text {
                    text: system_instruction.to_string(),
                }],
            }),
            generation_config: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<InlineData>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    error: GeminiErrorDetails,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetails {
    message: String,
}

impl GeminiResponse {
    /// Returns the first candidate after rejecting blocked prompts/outputs.
    fn into_first_candidate(self) -> Result<Option<GeminiCandidate>> {
        // Blocks arrive as HTTP 200
        if let Some(feedback) = self.prompt_feedback {
            if let Some(reason) = feedback.block_reason {
                let msg = feedback
                    .block_reason_message
                    .unwrap_or_else(|| format!("Prompt blocked: {reason}"));
                return Err(StudioError::ContentBlocked(msg));
            }
        }

        let Some(candidate) = self.candidates.into_iter().next() else {
            return Ok(None);
        };

        if let Some(reason) = candidate.finish_reason.as_deref() {
            if BLOCKING_FINISH_REASONS.contains(&reason) {
                return Err(StudioError::ContentBlocked(format!(
                    "Content blocked by Gemini safety filter: {reason}"
                )));
            }
        }

        Ok(Some(candidate))
    }

    fn into_first_image(self) -> Result<Option<ImageAsset>> {
        let Some(candidate) = self.into_first_candidate()? else {
            return Ok(None);
        };
        if let Some(reason) = candidate.finish_reason.as_deref() {
            if matches!(reason, "NO_IMAGE" | "IMAGE_OTHER") {
                tracing::warn!(finish_reason = reason, "model returned no image");
            }
        }

        Ok(candidate
            .content
            .into_iter()
            .flat_map(|c| c.parts)
            .find_map(|p| p.inline_data)
            .map(|inline| ImageAsset::from_base64(&inline.data, &inline.mime_type)))
    }

    fn into_text(self) -> Result<String> {
        let candidate = self.into_first_candidate()?.ok_or_else(|| {
            StudioError::UnexpectedResponse("No candidates in Gemini response".into())
        })?;

        let texts: Vec<String> = candidate
            .content
            .into_iter()
            .flat_map(|c| c.parts)
            .filter(|p| !p.thought)
            .filter_map(|p| p.text)
            .collect();

        if texts.is_empty() {
            return Err(StudioError::UnexpectedResponse(
                "No text in Gemini response".into(),
            ));
        }
        Ok(texts.concat())
    }
}
