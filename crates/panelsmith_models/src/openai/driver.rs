//! OpenAI-compatible driver using reqwest.

use super::dto::{ChatCompletionRequest, ChatCompletionResponse, error_detail, map_usage};
use async_trait::async_trait;
use derive_builder::Builder;
use derive_getters::Getters;
use panelsmith_config::{ProviderSettings, RequestSettings};
use panelsmith_core::{ChatRequest, ChatResponse, ResponseFormat};
use panelsmith_error::{
    ConfigError, PanelsmithResult, UpstreamError, UpstreamErrorKind,
};
use panelsmith_interface::ModelDriver;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, error, instrument};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_TIMEOUT_MS: u64 = 120_000;

/// Sampling parameters of a model profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Builder, Getters)]
#[builder(setter(into, strip_option), default)]
pub struct GenerationParams {
    /// Sampling temperature
    temperature: Option<f32>,
    /// Nucleus sampling
    top_p: Option<f32>,
    /// Output token cap
    max_tokens: Option<u32>,
    /// Presence penalty
    presence_penalty: Option<f32>,
    /// Frequency penalty
    frequency_penalty: Option<f32>,
}

impl GenerationParams {
    /// Creates a new builder for `GenerationParams`.
    pub fn builder() -> GenerationParamsBuilder {
        GenerationParamsBuilder::default()
    }
}

/// Connection settings for one OpenAI-compatible endpoint.
#[derive(Debug, Clone, Builder, Getters)]
#[builder(setter(into))]
pub struct OpenAiCompatibleConfig {
    /// Provider label used in logs
    #[builder(default = "\"openai\".to_string()")]
    provider: String,
    /// Base URL; `/v1` suffixes are tolerated
    #[builder(default = "DEFAULT_BASE_URL.to_string()")]
    base_url: String,
    /// Bearer token
    api_key: String,
    /// Model identifier
    model: String,
    /// Sampling parameters
    #[builder(default)]
    params: GenerationParams,
    /// Per-call timeout
    #[builder(default = "DEFAULT_TIMEOUT_MS")]
    timeout_ms: u64,
}

impl OpenAiCompatibleConfig {
    /// Creates a new builder for `OpenAiCompatibleConfig`.
    pub fn builder() -> OpenAiCompatibleConfigBuilder {
        OpenAiCompatibleConfigBuilder::default()
    }

    /// Build from a configured provider profile, reading the key from its env var.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the key variable is unset or empty.
    pub fn from_settings(
        provider: &str,
        settings: &ProviderSettings,
        request: &RequestSettings,
    ) -> PanelsmithResult<Self> {
        let api_key = std::env::var(&settings.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                ConfigError::for_key(
                    settings.api_key_env.clone(),
                    format!("not set; the '{}' provider needs an API key", provider),
                )
            })?;

        Ok(Self {
            provider: provider.to_string(),
            base_url: settings.base_url.clone(),
            api_key,
            model: settings.model.clone(),
            params: GenerationParams {
                temperature: settings.temperature,
                max_tokens: settings.max_tokens,
                ..Default::default()
            },
            timeout_ms: request.timeout_ms,
        })
    }
}

/// Strip trailing `/`, `/v1` and `/v1beta`; blank means the OpenAI default.
///
/// # Examples
///
/// ```
/// use panelsmith_models::normalize_base_url;
///
/// assert_eq!(normalize_base_url("https://api.deepseek.com/v1/"), "https://api.deepseek.com");
/// assert_eq!(normalize_base_url("  "), "https://api.openai.com");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim();
    let base = if trimmed.is_empty() {
        DEFAULT_BASE_URL
    } else {
        trimmed
    };
    let base = base.strip_suffix('/').unwrap_or(base);
    let base = base
        .strip_suffix("/v1beta")
        .or_else(|| base.strip_suffix("/v1"))
        .unwrap_or(base);
    base.to_string()
}

/// Full chat completions URL for a base URL.
pub fn chat_completions_url(base_url: &str) -> String {
    format!("{}/v1/chat/completions", normalize_base_url(base_url))
}

/// Driver for OpenAI-compatible chat completion APIs.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleDriver {
    client: Client,
    config: OpenAiCompatibleConfig,
    url: String,
}

impl OpenAiCompatibleDriver {
    /// Creates a new driver.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be initialized.
    #[instrument(skip_all, fields(provider = %config.provider, model = %config.model))]
    pub fn new(config: OpenAiCompatibleConfig) -> PanelsmithResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| {
                UpstreamError::new(UpstreamErrorKind::Transport(format!(
                    "Failed to build HTTP client: {}",
                    e
                )))
            })?;
        let url = chat_completions_url(&config.base_url);

        debug!(url = %url, timeout_ms = config.timeout_ms, "Created OpenAI-compatible driver");

        Ok(Self {
            client,
            config,
            url,
        })
    }

    fn body<'a>(&'a self, request: &'a ChatRequest) -> ChatCompletionRequest<'a> {
        let params = &self.config.params;
        ChatCompletionRequest {
            model: &self.config.model,
            messages: &request.messages,
            temperature: request.temperature.or(params.temperature),
            top_p: params.top_p,
            max_tokens: request.max_tokens.or(params.max_tokens),
            presence_penalty: params.presence_penalty,
            frequency_penalty: params.frequency_penalty,
            response_format: request.response_format.map(|format| match format {
                ResponseFormat::Text => json!({"type": "text"}),
                ResponseFormat::JsonObject => json!({"type": "json_object"}),
            }),
        }
    }
}

#[async_trait]
impl ModelDriver for OpenAiCompatibleDriver {
    #[instrument(skip(self, request), fields(provider = %self.config.provider, model = %self.config.model, messages = request.messages.len()))]
    async fn invoke(&self, request: &ChatRequest) -> PanelsmithResult<ChatResponse> {
        let timeout_ms = self.config.timeout_ms;
        let map_send_error = |e: reqwest::Error| {
            if e.is_timeout() {
                error!(timeout_ms, "Model request timed out");
                UpstreamError::new(UpstreamErrorKind::Timeout { timeout_ms })
            } else {
                error!(error = ?e, "HTTP request failed");
                UpstreamError::new(UpstreamErrorKind::Transport(e.to_string()))
            }
        };

        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&self.body(request))
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = error_detail(&body);
            error!(status = %status, detail = %detail, "API error");
            return Err(UpstreamError::new(UpstreamErrorKind::Http {
                status: status.as_u16(),
                detail,
            })
            .into());
        }

        let text = response.text().await.map_err(map_send_error)?;
        let parsed: ChatCompletionResponse = serde_json::from_str(&text).map_err(|e| {
            error!(error = ?e, response_len = text.len(), "Failed to parse response");
            UpstreamError::new(UpstreamErrorKind::Decode(e.to_string()))
        })?;

        let content = parsed.content();
        let token_usage = parsed.usage.as_ref().and_then(map_usage);
        debug!(content_len = content.len(), usage = ?token_usage, "Received response");

        Ok(ChatResponse::new(content, token_usage))
    }

    fn provider_name(&self) -> &'static str {
        "openai_compatible"
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panelsmith_core::Message;

    fn driver(params: GenerationParams) -> OpenAiCompatibleDriver {
        let config = OpenAiCompatibleConfig::builder()
            .provider("kimi")
            .base_url("https://api.moonshot.cn/v1")
            .api_key("test-key")
            .model("moonshot-v1-32k")
            .params(params)
            .build()
            .unwrap();
        OpenAiCompatibleDriver::new(config).unwrap()
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("https://api.openai.com/"), "https://api.openai.com");
        assert_eq!(normalize_base_url("https://gw.example/v1beta"), "https://gw.example");
        assert_eq!(normalize_base_url("https://gw.example/proxy"), "https://gw.example/proxy");
        assert_eq!(
            chat_completions_url("https://api.moonshot.cn/v1"),
            "https://api.moonshot.cn/v1/chat/completions"
        );
    }

    #[test]
    fn test_body_prefers_request_over_profile() {
        let params = GenerationParams::builder()
            .temperature(0.2f32)
            .max_tokens(2000u32)
            .top_p(0.9f32)
            .build()
            .unwrap();
        let driver = driver(params);
        let request = ChatRequest::builder()
            .messages(vec![Message::system("JSON only"), Message::user("go")])
            .max_tokens(Some(8000u32))
            .response_format(Some(ResponseFormat::JsonObject))
            .build()
            .unwrap();

        let body = serde_json::to_value(driver.body(&request)).unwrap();
        assert_eq!(body["model"], "moonshot-v1-32k");
        assert_eq!(body["max_tokens"], 8000);
        assert_eq!(body["top_p"], serde_json::json!(0.9f32));
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["response_format"]["type"], "json_object");
        assert!(body.get("presence_penalty").is_none());
    }

    #[test]
    fn test_body_omits_unset_params() {
        let driver = driver(GenerationParams::default());
        let body =
            serde_json::to_value(driver.body(&ChatRequest::from_messages(vec![Message::user("x")])))
                .unwrap();
        assert!(body.get("temperature").is_none());
        assert!(body.get("max_tokens").is_none());
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn test_url_is_normalized_on_construction() {
        let driver = driver(GenerationParams::default());
        assert_eq!(driver.url, "https://api.moonshot.cn/v1/chat/completions");
        assert_eq!(driver.model_name(), "moonshot-v1-32k");
    }
}
