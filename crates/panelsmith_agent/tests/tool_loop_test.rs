//! End-to-end loop runs against scripted drivers.

use async_trait::async_trait;
use panelsmith_agent::{
    AgentLoopConfig, EchoTool, ExecutionMode, FallbackOutcome, LegacyFallback, StepKind, ToolLoop,
    ToolRegistry, ToolStatus,
};
use panelsmith_core::{ChatRequest, ChatResponse, Message, Role, TokenUsage};
use panelsmith_error::{
    AgentErrorKind, PanelsmithError, PanelsmithErrorKind, PanelsmithResult, UpstreamErrorKind,
};
use panelsmith_interface::ModelDriver;
use panelsmith_interface::testing::ScriptedDriver;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Answer {
    answer: String,
}

struct LegacyAnswer {
    calls: AtomicUsize,
}

impl LegacyAnswer {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl LegacyFallback<Answer> for LegacyAnswer {
    async fn run(&self, _cause: &PanelsmithError) -> PanelsmithResult<FallbackOutcome<Answer>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(FallbackOutcome::new(
            Answer {
                answer: "legacy".to_string(),
            },
            "agent_failed_use_legacy",
        ))
    }
}

fn registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(EchoTool));
    registry
}

fn conversation() -> Vec<Message> {
    vec![
        Message::system("Reply with a tool_call or final JSON object."),
        Message::user("Say done after echoing."),
    ]
}

#[tokio::test]
async fn test_tool_call_then_final() {
    let driver = ScriptedDriver::new()
        .reply(
            r#"{"kind":"tool_call","toolName":"echo","toolInput":{"message":"ping"}}"#,
            Some(TokenUsage::new(5, 7, 12)),
        )
        .reply(
            r#"{"kind":"final","final":{"answer":"done"}}"#,
            Some(TokenUsage::new(6, 9, 15)),
        );
    let registry = registry();

    let outcome = ToolLoop::<Answer>::new(&driver, &registry, AgentLoopConfig::default())
        .run(conversation())
        .await
        .unwrap();

    assert_eq!(outcome.final_value.answer, "done");
    assert_eq!(outcome.execution_mode, ExecutionMode::Agent);
    assert!(!outcome.fallback_used);
    assert_eq!(outcome.token_usage.map(|u| u.total), Some(27));

    let kinds: Vec<StepKind> = outcome.trace.steps.iter().map(|s| s.kind).collect();
    assert_eq!(kinds, vec![StepKind::ToolCall, StepKind::Final]);
    let indices: Vec<u32> = outcome.trace.steps.iter().map(|s| s.index).collect();
    assert_eq!(indices, vec![1, 2]);

    let tool_call = outcome.trace.steps[0].tool_call.as_ref().unwrap();
    assert_eq!(tool_call.status, ToolStatus::Ok);
    assert_eq!(tool_call.output.as_ref().unwrap()["echo"], "ping");
    assert_eq!(outcome.trace.steps[1].token_usage.map(|u| u.total), Some(15));

    let second = &driver.requests()[1];
    assert_eq!(second.messages.len(), 4);
    assert_eq!(second.messages[2].role, Role::Assistant);
    assert!(second.messages[3].content.contains("\"toolResult\""));
    assert!(second.messages[3].content.contains("\"output\""));
}

#[tokio::test]
async fn test_unknown_tool_falls_back_to_legacy() {
    let driver = ScriptedDriver::new().reply(
        r#"{"kind":"tool_call","toolName":"search_web","toolInput":{}}"#,
        None,
    );
    let registry = registry();
    let legacy = LegacyAnswer::new();

    let outcome = ToolLoop::new(&driver, &registry, AgentLoopConfig::default())
        .with_fallback(&legacy)
        .run(conversation())
        .await
        .unwrap();

    assert_eq!(outcome.final_value.answer, "legacy");
    assert_eq!(outcome.execution_mode, ExecutionMode::Legacy);
    assert!(outcome.fallback_used);
    assert!(outcome.trace.fallback_used);
    assert_eq!(
        outcome.trace.fallback_reason.as_deref(),
        Some("agent_failed_use_legacy")
    );
    assert_eq!(driver.call_count(), 1);
    assert_eq!(legacy.calls.load(Ordering::SeqCst), 1);

    let kinds: Vec<StepKind> = outcome.trace.steps.iter().map(|s| s.kind).collect();
    assert_eq!(kinds, vec![StepKind::Error, StepKind::Fallback]);
    assert_eq!(
        outcome.trace.steps[0].error.as_deref(),
        Some("Agent unknown tool: search_web")
    );
}

#[tokio::test]
async fn test_max_steps_without_fallback_is_an_error() {
    let call = r#"{"kind":"tool_call","toolName":"echo","toolInput":{"message":"again"}}"#;
    let driver = ScriptedDriver::new()
        .reply(call, None)
        .reply(call, None)
        .reply(call, None);
    let registry = registry();
    let config = AgentLoopConfig::builder()
        .max_steps(2u32)
        .fallback_enabled(false)
        .build()
        .unwrap();
    let legacy = LegacyAnswer::new();

    let err = ToolLoop::new(&driver, &registry, config)
        .with_fallback(&legacy)
        .run(conversation())
        .await
        .unwrap_err();

    match err.kind() {
        PanelsmithErrorKind::Agent(e) => {
            assert_eq!(e.kind(), &AgentErrorKind::MaxStepsExceeded(2));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(driver.call_count(), 2);
    assert_eq!(legacy.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_tool_error_is_fed_back_to_model() {
    let driver = ScriptedDriver::new()
        .reply(
            r#"{"kind":"tool_call","toolName":"echo","toolInput":{"text":"wrong field"}}"#,
            None,
        )
        .reply(r#"{"kind":"final","final":{"answer":"recovered"}}"#, None);
    let registry = registry();

    let outcome = ToolLoop::<Answer>::new(&driver, &registry, AgentLoopConfig::default())
        .run(conversation())
        .await
        .unwrap();

    assert_eq!(outcome.final_value.answer, "recovered");
    let tool_call = outcome.trace.steps[0].tool_call.as_ref().unwrap();
    assert_eq!(tool_call.status, ToolStatus::Error);
    assert_eq!(tool_call.error.as_deref(), Some("message: expected a string"));

    let feedback = &driver.requests()[1].messages[3].content;
    let feedback: serde_json::Value = serde_json::from_str(feedback).unwrap();
    assert_eq!(feedback["toolResult"]["toolName"], "echo");
    assert_eq!(feedback["toolResult"]["error"], "message: expected a string");
}

#[tokio::test]
async fn test_upstream_error_skips_fallback() {
    let driver = ScriptedDriver::new().fail(UpstreamErrorKind::Http {
        status: 429,
        detail: "rate limited".to_string(),
    });
    let registry = registry();
    let legacy = LegacyAnswer::new();

    let err = ToolLoop::new(&driver, &registry, AgentLoopConfig::default())
        .with_fallback(&legacy)
        .run(conversation())
        .await
        .unwrap_err();

    assert!(err.is_upstream());
    assert_eq!(legacy.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_rejected_final_payload_falls_back() {
    let driver = ScriptedDriver::new().reply(r#"{"kind":"final","final":{"proceed":true}}"#, None);
    let registry = registry();
    let legacy = LegacyAnswer::new();

    let outcome = ToolLoop::new(&driver, &registry, AgentLoopConfig::default())
        .with_fallback(&legacy)
        .run(conversation())
        .await
        .unwrap();

    assert_eq!(outcome.execution_mode, ExecutionMode::Legacy);
    let error = outcome.trace.steps[0].error.as_deref().unwrap();
    assert!(error.starts_with("Agent final payload rejected"));
}

#[tokio::test]
async fn test_prose_reply_falls_back() {
    let driver = ScriptedDriver::new().reply("Let me think about which tool to use.", None);
    let registry = registry();
    let legacy = LegacyAnswer::new();

    let outcome = ToolLoop::new(&driver, &registry, AgentLoopConfig::default())
        .with_fallback(&legacy)
        .run(conversation())
        .await
        .unwrap();

    assert_eq!(outcome.execution_mode, ExecutionMode::Legacy);
    assert_eq!(
        outcome.trace.steps[0].model_output.as_deref(),
        Some("Let me think about which tool to use.")
    );
}

struct SlowDriver;

#[async_trait]
impl ModelDriver for SlowDriver {
    async fn invoke(&self, _request: &ChatRequest) -> PanelsmithResult<ChatResponse> {
        tokio::time::sleep(Duration::from_millis(500)).await;
        Ok(ChatResponse::new(r#"{"kind":"final","final":{"answer":"late"}}"#, None))
    }

    fn provider_name(&self) -> &'static str {
        "slow"
    }

    fn model_name(&self) -> &str {
        "slow-model"
    }
}

#[tokio::test]
async fn test_step_timeout_falls_back() {
    let registry = registry();
    let legacy = LegacyAnswer::new();
    let config = AgentLoopConfig::builder()
        .step_timeout_ms(20u64)
        .build()
        .unwrap();

    let outcome = ToolLoop::new(&SlowDriver, &registry, config)
        .with_fallback(&legacy)
        .run(conversation())
        .await
        .unwrap();

    assert_eq!(outcome.final_value.answer, "legacy");
    assert_eq!(
        outcome.trace.steps[0].error.as_deref(),
        Some("Agent model step 1 timed out after 20ms")
    );
}

#[tokio::test]
async fn test_total_timeout_without_fallback() {
    let registry = registry();
    let config = AgentLoopConfig::builder()
        .total_timeout_ms(30u64)
        .fallback_enabled(false)
        .build()
        .unwrap();

    let err = ToolLoop::<Answer>::new(&SlowDriver, &registry, config)
        .run(conversation())
        .await
        .unwrap_err();

    match err.kind() {
        PanelsmithErrorKind::Agent(e) => assert_eq!(e.kind(), &AgentErrorKind::Timeout(30)),
        other => panic!("unexpected error: {other}"),
    }
}

struct SlowTool;

#[async_trait]
impl panelsmith_agent::AgentTool for SlowTool {
    fn name(&self) -> &str {
        "slow"
    }

    fn description(&self) -> &str {
        "Takes five seconds to answer."
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object" })
    }

    async fn execute(&self, _input: serde_json::Value) -> PanelsmithResult<serde_json::Value> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(serde_json::json!({ "done": true }))
    }
}

#[tokio::test]
async fn test_tool_execution_is_capped_by_total_budget() {
    let driver = ScriptedDriver::new().reply(
        r#"{"kind":"tool_call","toolName":"slow","toolInput":{}}"#,
        None,
    );
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(SlowTool));
    let config = AgentLoopConfig::builder()
        .step_timeout_ms(10_000u64)
        .total_timeout_ms(200u64)
        .fallback_enabled(false)
        .build()
        .unwrap();

    let started = std::time::Instant::now();
    let err = ToolLoop::<Answer>::new(&driver, &registry, config)
        .run(conversation())
        .await
        .unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(2));
    match err.kind() {
        PanelsmithErrorKind::Agent(e) => assert_eq!(e.kind(), &AgentErrorKind::Timeout(200)),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(driver.call_count(), 1);
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct OpaqueAnswer;

impl Serialize for OpaqueAnswer {
    fn serialize<S: serde::Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        Err(serde::ser::Error::custom("opaque answer"))
    }
}

struct OpaqueLegacy;

#[async_trait]
impl LegacyFallback<OpaqueAnswer> for OpaqueLegacy {
    async fn run(
        &self,
        _cause: &PanelsmithError,
    ) -> PanelsmithResult<FallbackOutcome<OpaqueAnswer>> {
        Ok(FallbackOutcome::new(OpaqueAnswer, "agent_failed_use_legacy"))
    }
}

#[tokio::test]
async fn test_unserializable_fallback_answer_is_an_error() {
    let driver = ScriptedDriver::new().reply("No JSON here.", None);
    let registry = registry();

    let err = ToolLoop::<OpaqueAnswer>::new(&driver, &registry, AgentLoopConfig::default())
        .with_fallback(&OpaqueLegacy)
        .run(conversation())
        .await
        .unwrap_err();

    match err.kind() {
        PanelsmithErrorKind::Json(e) => {
            assert!(e.to_string().contains("legacy fallback answer"));
            assert!(e.to_string().contains("opaque answer"));
        }
        other => panic!("unexpected error: {other}"),
    }
}
