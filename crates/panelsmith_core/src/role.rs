//! Role types for conversation participants.

use serde::{Deserialize, Serialize};

/// Speaker of a chat message.
///
/// # Examples
///
/// ```
/// use panelsmith_core::Role;
///
/// assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
/// assert_eq!(format!("{}", Role::System), "System");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions that frame the conversation
    System,
    /// Prompts and tool observations
    User,
    /// Model replies
    Assistant,
}
