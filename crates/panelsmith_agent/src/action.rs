//! The two replies a model may give inside the loop.

use panelsmith_core::JsonKind;
use panelsmith_error::{AgentError, AgentErrorKind, PanelsmithResult};
use panelsmith_extraction::parse_json_from_text;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A model reply, discriminated by its `kind` field.
///
/// # Examples
///
/// ```
/// use panelsmith_agent::{AgentAction, parse_action};
///
/// let action = parse_action(r#"{"kind":"tool_call","toolName":"echo","toolInput":{"message":"hi"}}"#).unwrap();
/// assert!(matches!(action, AgentAction::ToolCall { ref tool_name, .. } if tool_name == "echo"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgentAction {
    /// Run a registered tool
    ToolCall {
        /// Registered tool name
        #[serde(rename = "toolName")]
        tool_name: String,
        /// Tool arguments; `{}` when absent
        #[serde(rename = "toolInput", default = "empty_input")]
        tool_input: Value,
    },
    /// Stop with an answer
    Final {
        /// The answer payload
        #[serde(rename = "final", default)]
        value: Value,
    },
}

fn empty_input() -> Value {
    Value::Object(Default::default())
}

/// Parse a model reply into an [`AgentAction`].
///
/// The reply goes through the extraction pipeline expecting an object, so
/// prose around the JSON and trailing commas are tolerated.
///
/// # Errors
///
/// An extraction error when no object can be recovered, or
/// [`AgentErrorKind::InvalidAction`] when the object is not a valid action.
pub fn parse_action(content: &str) -> PanelsmithResult<AgentAction> {
    let parsed = parse_json_from_text(content, Some(JsonKind::Object))?;
    let action: AgentAction = serde_json::from_value(parsed.json)
        .map_err(|e| AgentError::new(AgentErrorKind::InvalidAction(e.to_string())))?;

    if let AgentAction::ToolCall { tool_name, .. } = &action {
        if tool_name.trim().is_empty() {
            return Err(AgentError::new(AgentErrorKind::InvalidAction(
                "toolName must not be empty".to_string(),
            ))
            .into());
        }
    }
    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_final_inside_prose() {
        let action = parse_action("Done.\n```json\n{\"kind\":\"final\",\"final\":{\"ok\":true},}\n```").unwrap();
        assert_eq!(action, AgentAction::Final { value: json!({"ok": true}) });
    }

    #[test]
    fn test_missing_tool_input_defaults_to_empty_object() {
        let action = parse_action(r#"{"kind":"tool_call","toolName":"echo"}"#).unwrap();
        assert_eq!(
            action,
            AgentAction::ToolCall {
                tool_name: "echo".to_string(),
                tool_input: json!({}),
            }
        );
    }

    #[test]
    fn test_unknown_kind_is_invalid_action() {
        let err = parse_action(r#"{"kind":"think","thought":"hmm"}"#).unwrap_err();
        assert!(err.to_string().contains("not a valid action"));
    }

    #[test]
    fn test_empty_tool_name_is_rejected() {
        let err = parse_action(r#"{"kind":"tool_call","toolName":"  "}"#).unwrap_err();
        assert!(err.to_string().contains("toolName"));
    }

    #[test]
    fn test_non_json_reply_is_extraction_error() {
        let err = parse_action("I will now call the echo tool.").unwrap_err();
        assert!(err.is_fixable());
    }
}
