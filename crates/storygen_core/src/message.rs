//! Message types for conversation history.

use crate::{Input, Role};
use serde::{Deserialize, Serialize};

/// A message in a conversation.
///
/// # Examples
///
/// ```
/// use storygen_core::{Message, Role, Input};
///
/// let message = Message::user("Keywords: robot, kitten");
///
/// assert_eq!(message.role, Role::User);
/// assert_eq!(message.content, vec![Input::Text("Keywords: robot, kitten".to_string())]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message sender
    pub role: Role,
    /// The content of the message
    pub content: Vec<Input>,
}

impl Message {
    /// Creates a single-text message with the given role.
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: vec![Input::Text(text.into())],
        }
    }

    /// Creates a system message.
    pub fn system(text: impl Into<String>) -> Self {
        Self::text(Role::System, text)
    }

    /// Creates a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::text(Role::User, text)
    }

    /// Creates an assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::text(Role::Assistant, text)
    }

    /// Concatenates all text inputs of the message.
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .map(Input::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
