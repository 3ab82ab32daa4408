//! Fetching the preset placeholder image.

use crate::config::StudioConfig;
use crate::error::{Result, StudioError};
use crate::image::asset::{ImageAsset, ImageFormat};
use async_trait::async_trait;

/// Something that can produce the preset image.
#[async_trait]
pub trait PlaceholderSource: Send + Sync {
    /// Fetches the image. Every failure is a [`StudioError::PlaceholderFetch`].
    async fn fetch(&self) -> Result<ImageAsset>;
}

/// Downloads the placeholder from a fixed URL.
pub struct HttpPlaceholder {
    client: reqwest::Client,
    url: String,
}

impl HttpPlaceholder {
    /// Creates a source for `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    /// Uses the configured placeholder URL.
    pub fn from_config(config: &StudioConfig) -> Self {
        Self::new(config.placeholder_url.clone())
    }

    /// Returns the URL this source downloads.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PlaceholderSource for HttpPlaceholder {
    async fn fetch(&self) -> Result<ImageAsset> {
        let fetch_err = |e: reqwest::Error| StudioError::PlaceholderFetch(e.to_string());

        let response = self.client.get(&self.url).send().await.map_err(fetch_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(StudioError::PlaceholderFetch(format!(
                "{} returned {}",
                self.url, status
            )));
        }

        let declared = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(ImageFormat::from_mime_type);
        let bytes = response.bytes().await.map_err(fetch_err)?;

        let format = ImageFormat::from_magic_bytes(&bytes)
            .or(declared)
            .ok_or_else(|| {
                StudioError::PlaceholderFetch(format!("{} did not return an image", self.url))
            })?;

        tracing::debug!(url = %self.url, size = bytes.len(), mime_type = format.mime_type(), "placeholder fetched");
        Ok(ImageAsset::encode(&bytes, format.mime_type()))
    }
}
