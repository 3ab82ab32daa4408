//! Conversation state for the director's assistant.

use crate::chat::message::Message;
use crate::error::Result;
use crate::genai::GenAiClient;
use crate::lifecycle::RequestLifecycle;

/// First message of every session.
pub const WELCOME_MESSAGE: &str = "Greetings! I am your Director's Assistant, an expert in the \
golden age of silent cinema and the works of Charlie Chaplin. How can we modernize these timeless \
classics for today's audience?";

/// Shown in place of a reply when the chat call fails.
pub const APOLOGY_MESSAGE: &str =
    "I apologize, but I encountered an error processing your request. Please try again.";

/// A chat call captured at dispatch time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    /// Messages that preceded the new one.
    pub history: Vec<Message>,
    /// The new user message, trimmed.
    pub message: String,
}

/// Ordered, append-only chat history plus the chat request lifecycle.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
    lifecycle: RequestLifecycle,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    /// Starts a conversation seeded with the welcome message.
    pub fn new() -> Self {
        Self {
            messages: vec![Message::model(WELCOME_MESSAGE)],
            lifecycle: RequestLifecycle::Idle,
        }
    }

    /// Returns the history in display order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the most recent message.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Returns the chat request lifecycle.
    pub fn lifecycle(&self) -> RequestLifecycle {
        self.lifecycle
    }

    /// Returns true while waiting for a reply.
    pub fn is_waiting(&self) -> bool {
        self.lifecycle.is_in_flight()
    }

    /// Marks the last outcome as shown to the user.
    pub fn acknowledge(&mut self) {
        self.lifecycle.acknowledge();
    }

    /// Appends the user message and marks the chat in flight.
    ///
    /// Returns `None` without changing anything if `text` is blank or a
    /// reply is still pending.
    pub fn begin_send(&mut self, text: &str) -> Option<ChatRequest> {
        let text = text.trim();
        if text.is_empty() || !self.lifecycle.try_begin() {
            return None;
        }

        let history = self.messages.clone();
        self.messages.push(Message::user(text));
        Some(ChatRequest {
            history,
            message: text.to_string(),
        })
    }

    /// Appends the reply, or the apology if the call failed.
    ///
    /// Returns the appended message.
    pub fn apply_reply(&mut self, result: Result<String>) -> &Message {
        let message = match result {
            Ok(reply) => {
                self.lifecycle.finish(true);
                Message::model(reply)
            }
            Err(e) => {
                tracing::error!("chat failed: {e}");
                self.lifecycle.finish(false);
                Message::model(APOLOGY_MESSAGE)
            }
        };
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    /// Sends `text` and waits for the reply.
    ///
    /// Returns `None` when the message was rejected by [`Self::begin_send`];
    /// otherwise returns the appended model message.
    pub async fn send_message(&mut self, client: &dyn GenAiClient, text: &str) -> Option<&Message> {
        let request = self.begin_send(text)?;
        let result = client
            .request_chat_reply(&request.history, &request.message)
            .await;
        Some(self.apply_reply(result))
    }
}
