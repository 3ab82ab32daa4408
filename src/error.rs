//! Error types for the studio.

use std::time::Duration;

/// Maximum length of a provider error body kept in an error message.
const MAX_ERROR_BODY_LEN: usize = 500;

/// Errors that can occur while editing images or chatting.
#[derive(Debug, thiserror::Error)]
pub enum StudioError {
    /// Required configuration (e.g. the API key) is missing or invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// API key rejected by the provider.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Sanitized provider message.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Provider hint from the `Retry-After` header.
        retry_after: Option<Duration>,
    },

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// The provider answered with a shape we cannot use.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An image asset is not a `data:image/...;base64,...` URI.
    #[error("invalid image format: {0}")]
    InvalidImageFormat(String),

    /// Image bytes could not be recognized or decoded.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// The placeholder image could not be fetched.
    #[error("failed to fetch placeholder image: {0}")]
    PlaceholderFetch(String),

    /// I/O error (e.g., reading an input file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StudioError {
    /// Returns true if this error came from a call to the remote AI service.
    pub fn is_remote_call(&self) -> bool {
        matches!(
            self,
            Self::Auth(_)
                | Self::Api { .. }
                | Self::RateLimited { .. }
                | Self::ContentBlocked(_)
                | Self::UnexpectedResponse(_)
                | Self::Network(_)
                | Self::Json(_)
        )
    }
}

/// Result type alias for studio operations.
pub type Result<T> = std::result::Result<T, StudioError>;

/// Redacts API keys and truncates a provider error body for display.
pub(crate) fn sanitize_error_message(text: &str, api_key: &str) -> String {
    let text = text.trim();
    let text = if api_key.is_empty() {
        text.to_string()
    } else {
        text.replace(api_key, "[REDACTED]")
    };
    if text.chars().count() > MAX_ERROR_BODY_LEN {
        let truncated: String = text.chars().take(MAX_ERROR_BODY_LEN).collect();
        format!("{truncated}...")
    } else {
        text
    }
}

/// Parses a `Retry-After` header given in seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
