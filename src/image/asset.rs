//! Encoded image assets.

use crate::error::{Result, StudioError};
use base64::Engine;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

/// The only asset shape the editor sends to the model.
static DATA_URI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^data:(image/[a-zA-Z+]+);base64,(.+)$").expect("data URI pattern is valid")
});

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format (modern, efficient).
    WebP,
    /// GIF format.
    Gif,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
            Self::Gif => "gif",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
        }
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Maps a MIME type (parameters ignored) to a known format.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(Self::Gif);
        }

        None
    }

    /// Detects the format of a file, trusting content over the extension.
    pub fn detect(data: &[u8], path: &Path) -> Option<Self> {
        Self::from_magic_bytes(data).or_else(|| {
            path.extension()
                .and_then(|e| e.to_str())
                .and_then(Self::from_extension)
        })
    }
}

/// MIME type and base64 payload pulled out of an asset's data URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    /// Declared MIME type, e.g. `image/png`.
    pub mime_type: String,
    /// Base64 text, exactly as it appeared in the URI.
    pub data: String,
}

impl ImagePayload {
    /// Decodes the base64 payload into raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.data)
            .map_err(|e| StudioError::InvalidImage(e.to_string()))
    }
}

/// An image held as a displayable `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    uri: String,
}

impl ImageAsset {
    /// Encodes raw bytes with their MIME type into a data URI.
    pub fn encode(bytes: &[u8], mime_type: &str) -> Self {
        let data = base64::engine::general_purpose::STANDARD.encode(bytes);
        Self::from_base64(&data, mime_type)
    }

    /// Wraps an already base64-encoded payload.
    pub fn from_base64(data: &str, mime_type: &str) -> Self {
        Self {
            uri: format!("data:{mime_type};base64,{data}"),
        }
    }

    /// Wraps an existing URI without checking it; [`Self::extract`] does that.
    pub fn from_data_uri(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }

    /// Returns the data URI.
    pub fn data_uri(&self) -> &str {
        &self.uri
    }

    /// Splits the URI into MIME type and payload.
    ///
    /// Fails with [`StudioError::InvalidImageFormat`] unless the URI has the
    /// form `data:image/<type>;base64,<payload>`.
    pub fn extract(&self) -> Result<ImagePayload> {
        let caps = DATA_URI_RE.captures(&self.uri).ok_or_else(|| {
            let prefix: String = self.uri.chars().take(32).collect();
            StudioError::InvalidImageFormat(format!("expected an image data URI, got {prefix:?}"))
        })?;
        Ok(ImagePayload {
            mime_type: caps[1].to_string(),
            data: caps[2].to_string(),
        })
    }

    /// Returns the known format of this asset, if any.
    pub fn format(&self) -> Option<ImageFormat> {
        let payload = self.extract().ok()?;
        ImageFormat::from_mime_type(&payload.mime_type)
    }

    /// Returns the size of the data URI in bytes.
    pub fn size(&self) -> usize {
        self.uri.len()
    }

    /// Decodes the asset and writes the raw image to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.extract()?.decode()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}
