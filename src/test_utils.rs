//! Scripted collaborators for unit tests.

use crate::chat::Message;
use crate::error::{Result, StudioError};
use crate::genai::GenAiClient;
use crate::image::{ImageAsset, PlaceholderSource};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

type EditCall = (String, String, String);
type ChatCall = (Vec<Message>, String);

/// Replays queued results and records every call it receives.
#[derive(Default)]
pub struct ScriptedClient {
    edits: Mutex<VecDeque<Result<Option<ImageAsset>>>>,
    replies: Mutex<VecDeque<Result<String>>>,
    edit_calls: Mutex<Vec<EditCall>>,
    chat_calls: Mutex<Vec<ChatCall>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_edit(self, result: Result<Option<ImageAsset>>) -> Self {
        self.edits.lock().unwrap().push_back(result);
        self
    }

    pub fn with_reply(self, result: Result<String>) -> Self {
        self.replies.lock().unwrap().push_back(result);
        self
    }

    pub fn edit_calls(&self) -> Vec<EditCall> {
        self.edit_calls.lock().unwrap().clone()
    }

    pub fn chat_calls(&self) -> Vec<ChatCall> {
        self.chat_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenAiClient for ScriptedClient {
    async fn request_image_edit(
        &self,
        image_base64: &str,
        mime_type: &str,
        prompt: &str,
    ) -> Result<Option<ImageAsset>> {
        self.edit_calls.lock().unwrap().push((
            image_base64.to_string(),
            mime_type.to_string(),
            prompt.to_string(),
        ));
        self.edits
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(StudioError::UnexpectedResponse("no scripted edit".into())))
    }

    async fn request_chat_reply(&self, history: &[Message], message: &str) -> Result<String> {
        self.chat_calls
            .lock()
            .unwrap()
            .push((history.to_vec(), message.to_string()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(StudioError::UnexpectedResponse("no scripted reply".into())))
    }

    fn name(&self) -> &str {
        "scripted"
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

/// A placeholder source that always returns the same outcome.
pub struct StaticPlaceholder {
    asset: std::result::Result<ImageAsset, String>,
}

impl StaticPlaceholder {
    pub fn new(asset: ImageAsset) -> Self {
        Self { asset: Ok(asset) }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            asset: Err(reason.to_string()),
        }
    }
}

#[async_trait]
impl PlaceholderSource for StaticPlaceholder {
    async fn fetch(&self) -> Result<ImageAsset> {
        self.asset
            .clone()
            .map_err(StudioError::PlaceholderFetch)
    }
}
