//! Wire types for the chat completions endpoint.

use panelsmith_core::{Message, TokenUsage};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Choice {
    #[serde(default)]
    pub message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    pub fn content(&self) -> String {
        self.choices
            .first()
            .and_then(|choice| choice.message.as_ref())
            .and_then(|message| message.content.clone())
            .unwrap_or_default()
    }
}

/// Map a provider usage object to [`TokenUsage`].
///
/// Accepts `prompt_tokens/completion_tokens/total_tokens` and the
/// `input_tokens/output_tokens` spelling; a missing total is the sum.
///
/// # Examples
///
/// ```
/// use panelsmith_models::map_usage;
/// use panelsmith_core::TokenUsage;
/// use serde_json::json;
///
/// assert_eq!(
///     map_usage(&json!({"input_tokens": 10, "output_tokens": 4})),
///     Some(TokenUsage::new(10, 4, 14))
/// );
/// assert_eq!(map_usage(&json!({"prompt_tokens": 10})), None);
/// ```
pub fn map_usage(usage: &Value) -> Option<TokenUsage> {
    let field = |primary: &str, fallback: &str| {
        usage
            .get(primary)
            .and_then(Value::as_u64)
            .or_else(|| usage.get(fallback).and_then(Value::as_u64))
    };
    let prompt = field("prompt_tokens", "input_tokens")?;
    let completion = field("completion_tokens", "output_tokens")?;
    let total = usage
        .get("total_tokens")
        .and_then(Value::as_u64)
        .unwrap_or(prompt + completion);
    Some(TokenUsage::new(prompt, completion, total))
}

/// Best diagnostic from an error body: `error.message`, else the raw body.
pub(crate) fn error_detail(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .and_then(|error| error.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_map_usage_standard_fields() {
        let usage = json!({"prompt_tokens": 120, "completion_tokens": 30, "total_tokens": 150});
        assert_eq!(map_usage(&usage), Some(TokenUsage::new(120, 30, 150)));
    }

    #[test]
    fn test_error_detail_prefers_message() {
        assert_eq!(
            error_detail(r#"{"error": {"message": "Invalid API key", "type": "auth"}}"#),
            "Invalid API key"
        );
        assert_eq!(error_detail("Bad Gateway\n"), "Bad Gateway");
    }

    #[test]
    fn test_response_content() {
        let response: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "{\"ok\":true}"}}],
            "usage": {"prompt_tokens": 1, "completion_tokens": 2, "total_tokens": 3}
        }))
        .unwrap();
        assert_eq!(response.content(), "{\"ok\":true}");

        let empty: ChatCompletionResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.content(), "");
    }
}
