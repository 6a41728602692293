//! Model invocation.

use async_trait::async_trait;
use panelsmith_core::{ChatRequest, ChatResponse};
use panelsmith_error::PanelsmithResult;

/// A chat model behind some provider API.
///
/// Provider configuration (endpoint, key, model, timeout) is bound when the
/// driver is built. `invoke` fails with an upstream error on non-success
/// responses and on timeout.
#[async_trait]
pub trait ModelDriver: Send + Sync {
    /// Send the conversation and return the model's text.
    async fn invoke(&self, request: &ChatRequest) -> PanelsmithResult<ChatResponse>;

    /// Provider identifier, e.g. "openai" or "deepseek".
    fn provider_name(&self) -> &'static str;

    /// Model identifier.
    fn model_name(&self) -> &str;
}
