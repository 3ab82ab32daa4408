//! Chat with the director's assistant.

mod conversation;
mod message;

pub use conversation::{ChatRequest, Conversation, APOLOGY_MESSAGE, WELCOME_MESSAGE};
pub use message::{Message, Role};
