//! Editor state: the loaded original, the latest edit, and the edit request.

use crate::error::{Result, StudioError};
use crate::genai::GenAiClient;
use crate::image::asset::{ImageAsset, ImageFormat};
use crate::image::placeholder::PlaceholderSource;
use crate::lifecycle::RequestLifecycle;
use std::path::Path;

/// Everything the adapter needs for one edit, captured when it was dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRequest {
    /// Base64 payload of the original image.
    pub image_base64: String,
    /// MIME type of the original image.
    pub mime_type: String,
    /// Edit instruction.
    pub prompt: String,
    generation: u64,
}

/// What applying an edit result did to the session.
#[derive(Debug)]
pub enum EditOutcome {
    /// The edited slot now holds the new image.
    Edited,
    /// The model replied without an image; the previous edit is kept.
    NoImage,
    /// A different original was loaded while the request was in flight;
    /// the result was discarded.
    Stale,
    /// The request failed. Nothing changed.
    Failed(StudioError),
}

impl EditOutcome {
    /// Returns true if the edited slot changed.
    pub fn is_edited(&self) -> bool {
        matches!(self, Self::Edited)
    }
}

/// State of the image editor panel.
#[derive(Debug, Default)]
pub struct ImageSession {
    original: Option<ImageAsset>,
    edited: Option<ImageAsset>,
    edit_prompt: Option<String>,
    // Bumped on every load so late edit results can be recognized.
    generation: u64,
    lifecycle: RequestLifecycle,
}

impl ImageSession {
    /// Creates an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the loaded original, if any.
    pub fn original(&self) -> Option<&ImageAsset> {
        self.original.as_ref()
    }

    /// Returns the latest edit of the current original, if any.
    pub fn edited(&self) -> Option<&ImageAsset> {
        self.edited.as_ref()
    }

    /// Returns the prompt that produced [`Self::edited`].
    pub fn edit_prompt(&self) -> Option<&str> {
        self.edit_prompt.as_deref()
    }

    /// Returns the edit request lifecycle.
    pub fn lifecycle(&self) -> RequestLifecycle {
        self.lifecycle
    }

    /// Returns true while an edit is in flight.
    pub fn is_editing(&self) -> bool {
        self.lifecycle.is_in_flight()
    }

    /// Returns true if a new edit with `prompt` would be dispatched.
    pub fn can_submit(&self, prompt: &str) -> bool {
        self.original.is_some() && !prompt.trim().is_empty() && !self.is_editing()
    }

    /// Marks the last outcome as shown to the user.
    pub fn acknowledge(&mut self) {
        self.lifecycle.acknowledge();
    }

    /// Loads raw file bytes as the new original and clears the edit.
    pub fn load_from_file(&mut self, bytes: &[u8], mime_type: &str) {
        self.set_original(ImageAsset::encode(bytes, mime_type));
    }

    /// Reads an image file from disk and loads it as the new original.
    ///
    /// Only recognized image files are accepted; anything else leaves the
    /// session untouched.
    pub fn load_from_path(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let format = ImageFormat::detect(&bytes, path).ok_or_else(|| {
            StudioError::InvalidImage(format!("{} is not a supported image", path.display()))
        })?;
        self.load_from_file(&bytes, format.mime_type());
        tracing::debug!(path = %path.display(), mime_type = format.mime_type(), "loaded original image");
        Ok(())
    }

    /// Fetches the preset image and loads it as the new original.
    ///
    /// On failure the error is logged and returned; the session keeps
    /// whatever it showed before.
    pub async fn load_from_remote_placeholder(
        &mut self,
        source: &dyn PlaceholderSource,
    ) -> Result<()> {
        match source.fetch().await {
            Ok(asset) => {
                self.set_original(asset);
                Ok(())
            }
            Err(e) => {
                tracing::error!("failed to load placeholder: {e}");
                Err(e)
            }
        }
    }

    /// Loads an already-encoded asset as the new original.
    pub fn set_original(&mut self, asset: ImageAsset) {
        self.original = Some(asset);
        self.edited = None;
        self.edit_prompt = None;
        self.generation += 1;
    }

    /// Starts an edit.
    ///
    /// Returns `None` without changing anything when no original is loaded,
    /// the prompt is blank, or an edit is already in flight. Otherwise the
    /// session is marked in flight; if the original is not an image data URI
    /// it is marked failed instead and the error is returned.
    pub fn begin_edit(&mut self, prompt: &str) -> Option<Result<EditRequest>> {
        if !self.can_submit(prompt) {
            return None;
        }
        let original = self.original.as_ref()?;
        self.lifecycle.try_begin();

        let payload = match original.extract() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("edit failed: {e}");
                self.lifecycle.finish(false);
                return Some(Err(e));
            }
        };

        Some(Ok(EditRequest {
            image_base64: payload.data,
            mime_type: payload.mime_type,
            prompt: prompt.trim().to_string(),
            generation: self.generation,
        }))
    }

    /// Applies the adapter's answer to a request from [`Self::begin_edit`].
    pub fn apply_edit(
        &mut self,
        request: &EditRequest,
        result: Result<Option<ImageAsset>>,
    ) -> EditOutcome {
        if request.generation != self.generation {
            tracing::debug!("discarding edit result for a replaced original");
            self.lifecycle = RequestLifecycle::Idle;
            return EditOutcome::Stale;
        }

        match result {
            Ok(Some(asset)) => {
                self.edited = Some(asset);
                self.edit_prompt = Some(request.prompt.clone());
                self.lifecycle.finish(true);
                EditOutcome::Edited
            }
            Ok(None) => {
                tracing::warn!(prompt = %request.prompt, "edit returned no image, keeping previous result");
                self.lifecycle.finish(true);
                EditOutcome::NoImage
            }
            Err(e) => {
                tracing::error!("edit failed: {e}");
                self.lifecycle.finish(false);
                EditOutcome::Failed(e)
            }
        }
    }

    /// Runs a whole edit: guard, one adapter call, apply.
    ///
    /// Returns `None` when the guard in [`Self::begin_edit`] rejected the
    /// request, in which case the adapter was not called.
    pub async fn submit_edit(
        &mut self,
        client: &dyn GenAiClient,
        prompt: &str,
    ) -> Option<EditOutcome> {
        let request = match self.begin_edit(prompt)? {
            Ok(request) => request,
            Err(e) => return Some(EditOutcome::Failed(e)),
        };
        let result = client
            .request_image_edit(&request.image_base64, &request.mime_type, &request.prompt)
            .await;
        Some(self.apply_edit(&request, result))
    }
}
