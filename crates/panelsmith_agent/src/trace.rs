//! Execution trace of one loop run.
//!
//! The serialized form is stored next to the generated artifact and compared
//! across services, so field names are camelCase and timestamps carry
//! milliseconds.

use chrono::{DateTime, Utc};
use panelsmith_core::TokenUsage;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which path produced the answer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExecutionMode {
    /// The tool-calling loop finished
    Agent,
    /// The legacy fallback finished
    Legacy,
}

/// What happened in a step.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StepKind {
    /// A tool was executed
    ToolCall,
    /// The model answered
    Final,
    /// The loop stopped on a failure
    Error,
    /// The legacy path ran
    Fallback,
}

/// Outcome of a tool execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    /// Tool returned output
    Ok,
    /// Tool failed or timed out
    Error,
}

/// A tool execution inside a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallRecord {
    /// Tool name
    pub name: String,
    /// Arguments given by the model
    pub input: Value,
    /// Tool output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    /// Whether the tool succeeded
    pub status: ToolStatus,
    /// Failure message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One recorded step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceStep {
    /// 1-based, increasing by one per step
    pub index: u32,
    /// Step kind
    pub kind: StepKind,
    /// Start time
    #[serde(with = "panelsmith_core::timestamp")]
    pub started_at: DateTime<Utc>,
    /// End time
    #[serde(with = "panelsmith_core::timestamp")]
    pub finished_at: DateTime<Utc>,
    /// Wall-clock duration
    pub duration_ms: u64,
    /// Raw model reply of this step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_output: Option<String>,
    /// Tool execution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolCallRecord>,
    /// Answer payload
    #[serde(rename = "final", default, skip_serializing_if = "Option::is_none")]
    pub final_value: Option<Value>,
    /// Failure message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Usage of this step's model call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<TokenUsage>,
}

/// Full trace of a loop run.
///
/// `fallback_used` is true exactly when `execution_mode` is
/// [`ExecutionMode::Legacy`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentTrace {
    /// Trace format version, currently 1
    pub version: u32,
    /// Path that produced the answer
    pub execution_mode: ExecutionMode,
    /// Whether the legacy path ran
    pub fallback_used: bool,
    /// Why the legacy path ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    /// Loop start
    #[serde(with = "panelsmith_core::timestamp")]
    pub started_at: DateTime<Utc>,
    /// Loop end
    #[serde(with = "panelsmith_core::timestamp")]
    pub finished_at: DateTime<Utc>,
    /// Wall-clock duration
    pub total_duration_ms: u64,
    /// Steps in order
    pub steps: Vec<TraceStep>,
}

impl AgentTrace {
    /// Current trace format version.
    pub const VERSION: u32 = 1;

    /// Steps of one kind.
    pub fn steps_of(&self, kind: StepKind) -> impl Iterator<Item = &TraceStep> {
        self.steps.iter().filter(move |step| step.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_serialized_shape() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let trace = AgentTrace {
            version: AgentTrace::VERSION,
            execution_mode: ExecutionMode::Legacy,
            fallback_used: true,
            fallback_reason: Some("budget".to_string()),
            started_at: at,
            finished_at: at,
            total_duration_ms: 0,
            steps: vec![TraceStep {
                index: 1,
                kind: StepKind::Fallback,
                started_at: at,
                finished_at: at,
                duration_ms: 0,
                model_output: None,
                tool_call: None,
                final_value: Some(json!({"proceed": true})),
                error: Some("Agent reached max steps (6)".to_string()),
                token_usage: None,
            }],
        };

        let value = serde_json::to_value(&trace).unwrap();
        assert_eq!(value["executionMode"], "legacy");
        assert_eq!(value["fallbackUsed"], true);
        assert_eq!(value["startedAt"], "2024-01-01T00:00:00.000Z");
        assert_eq!(value["steps"][0]["kind"], "fallback");
        assert_eq!(value["steps"][0]["final"], json!({"proceed": true}));
        assert!(value["steps"][0].get("toolCall").is_none());
    }
}
