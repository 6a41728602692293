//! Request and response types for chat completion.

use crate::{Message, TokenUsage};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Output format hint passed to providers that support it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Free text
    #[display("text")]
    Text,
    /// A single JSON object
    #[display("json_object")]
    JsonObject,
}

/// A chat completion request.
///
/// Sampling fields left as `None` fall back to the driver's profile.
///
/// # Examples
///
/// ```
/// use panelsmith_core::{ChatRequest, Message};
///
/// let request = ChatRequest::builder()
///     .messages(vec![Message::system("Reply in JSON."), Message::user("Go")])
///     .max_tokens(Some(8000u32))
///     .build()
///     .unwrap();
///
/// assert_eq!(request.messages.len(), 2);
/// assert_eq!(request.max_tokens, Some(8000));
/// assert!(request.temperature.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Builder)]
#[builder(setter(into))]
pub struct ChatRequest {
    /// The conversation messages to send
    pub messages: Vec<Message>,
    /// Maximum number of tokens to generate
    #[builder(default)]
    pub max_tokens: Option<u32>,
    /// Sampling temperature
    #[builder(default)]
    pub temperature: Option<f32>,
    /// Requested output format
    #[builder(default)]
    pub response_format: Option<ResponseFormat>,
}

impl ChatRequest {
    /// Create a builder.
    pub fn builder() -> ChatRequestBuilder {
        ChatRequestBuilder::default()
    }

    /// Request with only messages set.
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }
}

/// The text a model returned plus its reported usage.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    /// Raw text content
    pub content: String,
    /// Usage reported by the provider, when any
    pub token_usage: Option<TokenUsage>,
}

impl ChatResponse {
    /// Response with content and usage.
    pub fn new(content: impl Into<String>, token_usage: Option<TokenUsage>) -> Self {
        Self {
            content: content.into(),
            token_usage,
        }
    }
}
