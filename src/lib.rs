#![warn(missing_docs)]
//! Chaplin Studio - Gemini-backed image editing and a silent-film chat assistant.
//!
//! The crate holds the two pieces of client state behind the studio's
//! panels and the adapter they talk to:
//!
//! - [`ImageSession`]: the loaded original frame, its latest edit, and the
//!   edit request lifecycle.
//! - [`Conversation`]: the message history with the director's assistant.
//! - [`GenAiClient`]: the two remote calls, implemented for Gemini by
//!   [`GeminiClient`].
//!
//! # Quick Start - Editing
//!
//! ```no_run
//! use chaplin_studio::{GeminiClient, ImageSession, StudioConfig};
//!
//! #[tokio::main]
//! async fn main() -> chaplin_studio::Result<()> {
//!     let client = GeminiClient::new(StudioConfig::from_env()?);
//!     let mut session = ImageSession::new();
//!     session.load_from_path("frame.png")?;
//!     session.submit_edit(&client, "add sepia tone").await;
//!     if let Some(edited) = session.edited() {
//!         edited.save("frame-sepia.png")?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Quick Start - Chat
//!
//! ```no_run
//! use chaplin_studio::{Conversation, GeminiClient};
//!
//! #[tokio::main]
//! async fn main() -> chaplin_studio::Result<()> {
//!     let client = GeminiClient::from_env()?;
//!     let mut conversation = Conversation::new();
//!     if let Some(reply) = conversation.send_message(&client, "How would you remake The Kid?").await {
//!         println!("{}", reply.text());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! `GEMINI_API_KEY` (or `GOOGLE_API_KEY`) must be set unless a key is passed
//! to [`StudioConfig::builder`]. See [`config`] for the optional overrides.

pub mod chat;
pub mod config;
mod error;
pub mod genai;
pub mod image;
mod lifecycle;

#[cfg(test)]
mod test_utils;

// Re-export error types at crate root
pub use error::{Result, StudioError};

pub use chat::{Conversation, Message, Role};
pub use config::{ImageModel, StudioConfig, StudioConfigBuilder};
pub use genai::{GeminiClient, GenAiClient};
pub use image::{EditOutcome, HttpPlaceholder, ImageAsset, ImageFormat, ImageSession};
pub use lifecycle::RequestLifecycle;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::chat::{Conversation, Message, Role};
    pub use crate::error::{Result, StudioError};
    pub use crate::genai::{GeminiClient, GenAiClient};
    pub use crate::image::{EditOutcome, ImageAsset, ImageSession, PlaceholderSource};
    pub use crate::StudioConfig;
}
