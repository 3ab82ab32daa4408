//! Client configuration.
//!
//! A [`StudioConfig`] is built once and handed to the client explicitly;
//! nothing in the crate reads the API key from a global.

use crate::error::{Result, StudioError};

/// Default Gemini REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default chat model.
pub const DEFAULT_CHAT_MODEL: &str = "gemini-3.1-pro-preview";

/// Fixed remote image used to seed the editor.
pub const DEFAULT_PLACEHOLDER_URL: &str = "https://picsum.photos/seed/chaplin/800/600?grayscale";

/// Persona sent as the system instruction with every chat request.
pub const DIRECTOR_SYSTEM_INSTRUCTION: &str = "You are a director's assistant and an expert in \
Charlie Chaplin and silent films. You help users modernize these films and brainstorm ideas to \
enthrall today's mass-market audience. You are creative, knowledgeable, and enthusiastic about \
blending classic cinema with modern AI technology.";

const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// Gemini image model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImageModel {
    /// Nano Banana - Gemini 2.5 Flash Image (fast, economical).
    #[default]
    NanoBanana,
    /// Nano Banana Pro - Gemini 3 Pro Image (highest quality).
    NanoBananaPro,
}

impl ImageModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NanoBanana => "gemini-2.5-flash-image",
            Self::NanoBananaPro => "nano-banana-pro-preview",
        }
    }

    /// Parses an API model identifier or a short alias.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "gemini-2.5-flash-image" | "nano-banana" => Some(Self::NanoBanana),
            "nano-banana-pro-preview" | "nano-banana-pro" => Some(Self::NanoBananaPro),
            _ => None,
        }
    }
}

impl std::fmt::Display for ImageModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved configuration for talking to Gemini.
#[derive(Clone)]
pub struct StudioConfig {
    /// API key sent as `x-goog-api-key`.
    pub api_key: String,
    /// REST endpoint without a trailing slash.
    pub base_url: String,
    /// Model used for image edits.
    pub image_model: ImageModel,
    /// Model used for chat replies.
    pub chat_model: String,
    /// Source of the preset image.
    pub placeholder_url: String,
    /// Persona sent with every chat request.
    pub system_instruction: String,
}

impl StudioConfig {
    /// Creates a new `StudioConfigBuilder`.
    pub fn builder() -> StudioConfigBuilder {
        StudioConfigBuilder::new()
    }

    /// Resolves the whole configuration from the environment.
    pub fn from_env() -> Result<Self> {
        Self::builder().build()
    }

    /// Returns the API key with all but the last four characters masked.
    pub fn redacted_api_key(&self) -> String {
        let count = self.api_key.chars().count();
        if count <= 4 {
            return "****".to_string();
        }
        let tail: String = self.api_key.chars().skip(count - 4).collect();
        format!("****{tail}")
    }
}

impl std::fmt::Debug for StudioConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudioConfig")
            .field("api_key", &self.redacted_api_key())
            .field("base_url", &self.base_url)
            .field("image_model", &self.image_model)
            .field("chat_model", &self.chat_model)
            .field("placeholder_url", &self.placeholder_url)
            .finish_non_exhaustive()
    }
}

/// Builder for [`StudioConfig`].
///
/// Values set on the builder win; anything left unset falls back to the
/// environment and then to the built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct StudioConfigBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    image_model: Option<ImageModel>,
    chat_model: Option<String>,
    placeholder_url: Option<String>,
    system_instruction: Option<String>,
}

impl StudioConfigBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `GEMINI_API_KEY`, then `GOOGLE_API_KEY`.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Overrides the REST endpoint. Falls back to `GEMINI_BASE_URL`.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the image model. Falls back to `CHAPLIN_IMAGE_MODEL`.
    pub fn image_model(mut self, model: ImageModel) -> Self {
        self.image_model = Some(model);
        self
    }

    /// Sets the chat model. Falls back to `CHAPLIN_CHAT_MODEL`.
    pub fn chat_model(mut self, model: impl Into<String>) -> Self {
        self.chat_model = Some(model.into());
        self
    }

    /// Sets the preset image URL. Falls back to `CHAPLIN_PLACEHOLDER_URL`.
    pub fn placeholder_url(mut self, url: impl Into<String>) -> Self {
        self.placeholder_url = Some(url.into());
        self
    }

    /// Replaces the chat persona.
    pub fn system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    /// Builds the config, failing fast if no API key can be found.
    pub fn build(self) -> Result<StudioConfig> {
        self.build_with(|name| std::env::var(name).ok())
    }

    fn build_with(self, env: impl Fn(&str) -> Option<String>) -> Result<StudioConfig> {
        let non_empty = |name: &str| env(name).filter(|v| !v.trim().is_empty());

        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .or_else(|| API_KEY_VARS.iter().find_map(|name| non_empty(*name)))
            .ok_or_else(|| {
                StudioError::Configuration(
                    "GEMINI_API_KEY not set and no API key provided".into(),
                )
            })?;

        let image_model = match self.image_model {
            Some(model) => model,
            None => match non_empty("CHAPLIN_IMAGE_MODEL") {
                Some(name) => ImageModel::from_name(&name).ok_or_else(|| {
                    StudioError::Configuration(format!("unknown image model: {name}"))
                })?,
                None => ImageModel::default(),
            },
        };

        let base_url = self
            .base_url
            .or_else(|| non_empty("GEMINI_BASE_URL"))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(StudioConfig {
            api_key,
            base_url,
            image_model,
            chat_model: self
                .chat_model
                .or_else(|| non_empty("CHAPLIN_CHAT_MODEL"))
                .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            placeholder_url: self
                .placeholder_url
                .or_else(|| non_empty("CHAPLIN_PLACEHOLDER_URL"))
                .unwrap_or_else(|| DEFAULT_PLACEHOLDER_URL.to_string()),
            system_instruction: self
                .system_instruction
                .unwrap_or_else(|| DIRECTOR_SYSTEM_INSTRUCTION.to_string()),
        })
    }
}
