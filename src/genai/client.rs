//! Adapter trait between the studio state and a generative-AI service.

use crate::chat::Message;
use crate::error::Result;
use crate::image::ImageAsset;
use async_trait::async_trait;

/// The two remote operations the studio consumes.
///
/// Implementations make exactly one outbound call per operation, never
/// retry, and never touch studio state; the caller decides what to do with
/// the outcome.
#[async_trait]
pub trait GenAiClient: Send + Sync {
    /// Asks the image model to edit `image_base64` according to `prompt`.
    ///
    /// Returns the first inline image of the reply as a data URI, or `None`
    /// if the reply carried no image.
    async fn request_image_edit(
        &self,
        image_base64: &str,
        mime_type: &str,
        prompt: &str,
    ) -> Result<Option<ImageAsset>>;

    /// Sends `history` followed by a new user `message` and returns the
    /// assistant's plain-text reply.
    async fn request_chat_reply(&self, history: &[Message], message: &str) -> Result<String>;

    /// Returns the name of this service for display.
    fn name(&self) -> &str;

    /// Checks if the service is reachable and the key is accepted.
    async fn health_check(&self) -> Result<()>;
}
