//! Live API tests, gated behind the `api` feature.

#![cfg(feature = "api")]

use panelsmith_core::{ChatRequest, Message};
use panelsmith_interface::ModelDriver;
use panelsmith_models::{OpenAiCompatibleConfig, OpenAiCompatibleDriver};

#[tokio::test]
async fn test_live_chat_completion() {
    let config = OpenAiCompatibleConfig::builder()
        .provider("openai")
        .api_key(std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY not set"))
        .model("gpt-4o-mini")
        .build()
        .unwrap();
    let driver = OpenAiCompatibleDriver::new(config).unwrap();

    let response = driver
        .invoke(&ChatRequest::from_messages(vec![Message::user(
            "Reply with the JSON object {\"ok\": true} and nothing else.",
        )]))
        .await
        .unwrap();

    assert!(response.content.contains("ok"));
    assert!(response.token_usage.is_some());
}
