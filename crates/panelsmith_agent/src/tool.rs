//! Tools the model may call, and the registry that holds them.

use async_trait::async_trait;
use panelsmith_error::{AgentError, AgentErrorKind, PanelsmithResult};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A capability exposed to the model.
#[async_trait]
pub trait AgentTool: Send + Sync {
    /// Returns the tool name.
    fn name(&self) -> &str;

    /// Returns the tool description for the LLM.
    fn description(&self) -> &str;

    /// Returns the input schema as JSON Schema.
    fn input_schema(&self) -> Value;

    /// Executes the tool with the given input.
    async fn execute(&self, input: Value) -> PanelsmithResult<Value>;
}

/// Registry for managing agent tools, ordered by name.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn AgentTool>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ToolRegistry {
    /// Creates a new tool registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool, replacing any tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn AgentTool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Gets a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn AgentTool>> {
        self.tools.get(name).cloned()
    }

    /// Lists all registered tools.
    pub fn list(&self) -> Vec<Arc<dyn AgentTool>> {
        self.tools.values().cloned().collect()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Executes a tool by name.
    pub async fn execute(&self, name: &str, input: Value) -> PanelsmithResult<Value> {
        let tool = self
            .get(name)
            .ok_or_else(|| AgentError::new(AgentErrorKind::UnknownTool(name.to_string())))?;

        tool.execute(input).await
    }

    /// Tool catalogue for a system prompt: one block per tool with its schema.
    pub fn describe(&self) -> String {
        self.tools
            .values()
            .map(|tool| {
                format!(
                    "- {}: {}\n  input schema: {}",
                    tool.name(),
                    tool.description(),
                    tool.input_schema()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
