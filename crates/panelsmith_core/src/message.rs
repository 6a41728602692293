//! Message types for conversation history.

use crate::Role;
use serde::{Deserialize, Serialize};

/// A text message in a conversation.
///
/// # Examples
///
/// ```
/// use panelsmith_core::{Message, Role};
///
/// let message = Message::user("Plan ten episodes.");
/// assert_eq!(message.role, Role::User);
/// assert_eq!(message.content, "Plan ten episodes.");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message sender
    pub role: Role,
    /// The text content
    pub content: String,
}

impl Message {
    /// Create a message with the given role.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}
