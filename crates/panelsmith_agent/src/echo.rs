//! A tool that answers with what it was sent.
//!
//! Lets a prompt or a test check the call/feedback round trip without
//! touching storage.

use crate::AgentTool;
use async_trait::async_trait;
use panelsmith_core::timestamp;
use panelsmith_error::{PanelsmithResult, ToolError};
use serde_json::{Value, json};
use tracing::debug;

/// Returns `message` with its character count and the time it was seen.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoTool;

#[async_trait]
impl AgentTool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Returns the given message unchanged, with its length in characters."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "message": { "type": "string" }
            },
            "required": ["message"]
        })
    }

    async fn execute(&self, input: Value) -> PanelsmithResult<Value> {
        let Some(message) = input.get("message").and_then(Value::as_str) else {
            return Err(ToolError::new(self.name(), "message: expected a string").into());
        };
        debug!(length = message.len(), "Echoing message");

        Ok(json!({
            "echo": message,
            "chars": message.chars().count(),
            "seenAt": timestamp::format(&chrono::Utc::now()),
        }))
    }
}
