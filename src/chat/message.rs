//! Chat message types.

use serde::{Deserialize, Serialize};

/// Who authored a message. Serialized with the provider's role names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person using the studio.
    User,
    /// The assistant.
    Model,
}

impl Role {
    /// Returns the provider's role name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }

    /// Returns the label shown in the conversation view.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::User => "You",
            Self::Model => "Assistant",
        }
    }
}

/// One entry of the conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    text: String,
}

impl Message {
    /// Creates a message from the user.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    /// Creates a message from the assistant.
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }

    /// Returns the author.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the message body.
    pub fn text(&self) -> &str {
        &self.text
    }
}
