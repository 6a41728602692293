//! The loop itself.

use crate::{
    AgentAction, AgentLoopConfig, AgentTool, AgentTrace, ExecutionMode, LegacyFallback, StepKind,
    ToolCallRecord, ToolRegistry, ToolStatus, TraceStep, parse_action,
};
use chrono::{DateTime, Utc};
use panelsmith_core::{ChatRequest, Message, TokenUsage};
use panelsmith_error::{
    AgentError, AgentErrorKind, JsonError, PanelsmithError, PanelsmithErrorKind, PanelsmithResult,
    ToolError,
};
use panelsmith_interface::ModelDriver;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

/// Answer of a loop run with its trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolLoopOutcome<F> {
    /// The answer
    #[serde(rename = "final")]
    pub final_value: F,
    /// Path that produced it
    pub execution_mode: ExecutionMode,
    /// Whether the legacy path ran
    pub fallback_used: bool,
    /// Step-by-step record
    pub trace: AgentTrace,
    /// Usage summed across every model call
    pub token_usage: Option<TokenUsage>,
}

/// Runs a model through tool calls until it answers or a budget runs out.
pub struct ToolLoop<'a, F> {
    driver: &'a dyn ModelDriver,
    registry: &'a ToolRegistry,
    config: AgentLoopConfig,
    fallback: Option<&'a dyn LegacyFallback<F>>,
}

impl<F> std::fmt::Debug for ToolLoop<'_, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolLoop")
            .field("provider", &self.driver.provider_name())
            .field("registry", self.registry)
            .field("config", &self.config)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

/// Step being recorded.
struct OpenStep {
    started: Instant,
    started_at: DateTime<Utc>,
    model_output: Option<String>,
    token_usage: Option<TokenUsage>,
}

impl OpenStep {
    fn begin() -> Self {
        Self {
            started: Instant::now(),
            started_at: Utc::now(),
            model_output: None,
            token_usage: None,
        }
    }

    fn close(self, index: u32, kind: StepKind) -> TraceStep {
        TraceStep {
            index,
            kind,
            started_at: self.started_at,
            finished_at: Utc::now(),
            duration_ms: elapsed_ms(self.started),
            model_output: self.model_output,
            tool_call: None,
            final_value: None,
            error: None,
            token_usage: self.token_usage,
        }
    }
}

/// Mutable state of one run.
struct Session {
    messages: Vec<Message>,
    steps: Vec<TraceStep>,
    open: Option<OpenStep>,
    token_usage: Option<TokenUsage>,
}

impl Session {
    fn next_index(&self) -> u32 {
        self.steps.len() as u32 + 1
    }

    fn close_step(&mut self, kind: StepKind) -> &mut TraceStep {
        let index = self.next_index();
        let step = self.open.take().unwrap_or_else(OpenStep::begin).close(index, kind);
        self.steps.push(step);
        let last = self.steps.len() - 1;
        &mut self.steps[last]
    }
}

fn elapsed_ms(from: Instant) -> u64 {
    u64::try_from(from.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Message suitable for a trace or a model prompt, without source locations.
fn failure_message(err: &PanelsmithError) -> String {
    match err.kind() {
        PanelsmithErrorKind::Agent(e) => e.kind().to_string(),
        PanelsmithErrorKind::Extraction(e) => e.kind().to_string(),
        PanelsmithErrorKind::Tool(e) => e.message.clone(),
        PanelsmithErrorKind::Json(e) => e.message.clone(),
        PanelsmithErrorKind::Validation(e) => e.summary(),
        _ => err.to_string(),
    }
}

impl<'a, F> ToolLoop<'a, F>
where
    F: DeserializeOwned + Serialize + Send,
{
    /// Loop over a driver and a tool registry.
    pub fn new(
        driver: &'a dyn ModelDriver,
        registry: &'a ToolRegistry,
        config: AgentLoopConfig,
    ) -> Self {
        Self {
            driver,
            registry,
            config: config.normalized(),
            fallback: None,
        }
    }

    /// Legacy path used when the loop fails and fallback is enabled.
    pub fn with_fallback(mut self, fallback: &'a dyn LegacyFallback<F>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Run the loop from the initial conversation.
    ///
    /// # Errors
    ///
    /// Upstream errors from the driver always propagate. Budget and protocol
    /// failures propagate only when no fallback is enabled; errors raised by
    /// the fallback itself propagate.
    #[instrument(
        skip_all,
        fields(
            provider = self.driver.provider_name(),
            max_steps = *self.config.max_steps(),
            tools = self.registry.len()
        )
    )]
    pub async fn run(&self, messages: Vec<Message>) -> PanelsmithResult<ToolLoopOutcome<F>> {
        let started = Instant::now();
        let started_at = Utc::now();
        let mut session = Session {
            messages,
            steps: Vec::new(),
            open: None,
            token_usage: None,
        };

        let failure = match self.run_agent(&mut session, started).await {
            Ok(final_value) => {
                info!(steps = session.steps.len(), "Agent loop finished");
                return Ok(ToolLoopOutcome {
                    final_value,
                    execution_mode: ExecutionMode::Agent,
                    fallback_used: false,
                    trace: AgentTrace {
                        version: AgentTrace::VERSION,
                        execution_mode: ExecutionMode::Agent,
                        fallback_used: false,
                        fallback_reason: None,
                        started_at,
                        finished_at: Utc::now(),
                        total_duration_ms: elapsed_ms(started),
                        steps: session.steps,
                    },
                    token_usage: session.token_usage,
                });
            }
            Err(err) if err.is_upstream() => return Err(err),
            Err(err) => err,
        };

        let message = failure_message(&failure);
        session.close_step(StepKind::Error).error = Some(message.clone());

        let fallback = match self.fallback {
            Some(fallback) if *self.config.fallback_enabled() => fallback,
            _ => {
                warn!(error = %message, "Agent loop failed without fallback");
                return Err(failure);
            }
        };

        warn!(error = %message, "Agent loop failed, running legacy fallback");
        session.open = Some(OpenStep::begin());
        let outcome = fallback.run(&failure).await?;
        let final_json = serde_json::to_value(&outcome.final_value)
            .map_err(|e| JsonError::new("legacy fallback answer", e))?;
        let step = session.close_step(StepKind::Fallback);
        step.error = Some(message.clone());
        step.final_value = Some(final_json);

        let reason = outcome.reason.unwrap_or(message);
        info!(reason = %reason, "Legacy fallback finished");
        Ok(ToolLoopOutcome {
            final_value: outcome.final_value,
            execution_mode: ExecutionMode::Legacy,
            fallback_used: true,
            trace: AgentTrace {
                version: AgentTrace::VERSION,
                execution_mode: ExecutionMode::Legacy,
                fallback_used: true,
                fallback_reason: Some(reason),
                started_at,
                finished_at: Utc::now(),
                total_duration_ms: elapsed_ms(started),
                steps: session.steps,
            },
            token_usage: session.token_usage,
        })
    }

    async fn run_agent(&self, session: &mut Session, started: Instant) -> PanelsmithResult<F> {
        let max_steps = *self.config.max_steps();
        let total_ms = *self.config.total_timeout_ms();
        let step_ms = *self.config.step_timeout_ms();
        let total = Duration::from_millis(total_ms);
        let step_limit = Duration::from_millis(step_ms);

        for step in 1..=max_steps {
            let elapsed = started.elapsed();
            if elapsed >= total {
                return Err(AgentError::new(AgentErrorKind::Timeout(total_ms)).into());
            }
            let remaining = total - elapsed;
            session.open = Some(OpenStep::begin());

            let request = ChatRequest {
                messages: session.messages.clone(),
                max_tokens: *self.config.max_tokens(),
                ..Default::default()
            };
            let response = match timeout(step_limit.min(remaining), self.driver.invoke(&request)).await
            {
                Ok(result) => result?,
                Err(_) if remaining < step_limit => {
                    return Err(AgentError::new(AgentErrorKind::Timeout(total_ms)).into());
                }
                Err(_) => {
                    return Err(AgentError::new(AgentErrorKind::StepTimeout {
                        step,
                        timeout_ms: step_ms,
                    })
                    .into());
                }
            };

            session.token_usage = TokenUsage::merge(session.token_usage, response.token_usage);
            if let Some(open) = session.open.as_mut() {
                open.model_output = Some(response.content.clone());
                open.token_usage = response.token_usage;
            }

            match parse_action(&response.content)? {
                AgentAction::Final { value } => {
                    let final_value = serde_json::from_value::<F>(value.clone()).map_err(|e| {
                        AgentError::new(AgentErrorKind::InvalidFinal(e.to_string()))
                    })?;
                    debug!(step, "Agent returned final answer");
                    session.close_step(StepKind::Final).final_value = Some(value);
                    return Ok(final_value);
                }
                AgentAction::ToolCall {
                    tool_name,
                    tool_input,
                } => {
                    let tool = self.registry.get(&tool_name).ok_or_else(|| {
                        AgentError::new(AgentErrorKind::UnknownTool(tool_name.clone()))
                    })?;
                    let tool_limit = step_limit.min(total.saturating_sub(started.elapsed()));
                    let record = self.execute_tool(tool, tool_input, step, tool_limit).await;
                    let feedback = match (&record.output, &record.error) {
                        (Some(output), _) => json!({
                            "toolResult": { "toolName": record.name, "output": output }
                        }),
                        (None, error) => json!({
                            "toolResult": { "toolName": record.name, "error": error }
                        }),
                    };

                    session.messages.push(Message::assistant(response.content));
                    session.messages.push(Message::user(feedback.to_string()));
                    session.close_step(StepKind::ToolCall).tool_call = Some(record);
                }
            }
        }

        Err(AgentError::new(AgentErrorKind::MaxStepsExceeded(max_steps)).into())
    }

    #[instrument(skip(self, tool, input, limit), fields(tool = tool.name()))]
    async fn execute_tool(
        &self,
        tool: Arc<dyn AgentTool>,
        input: Value,
        step: u32,
        limit: Duration,
    ) -> ToolCallRecord {
        let name = tool.name().to_string();
        let result = match timeout(limit, tool.execute(input.clone())).await {
            Ok(result) => result,
            Err(_) => Err(ToolError::new(
                name.clone(),
                format!("timed out after {}ms", limit.as_millis()),
            )
            .into()),
        };

        match result {
            Ok(output) => {
                debug!("Tool succeeded");
                ToolCallRecord {
                    name,
                    input,
                    output: Some(output),
                    status: ToolStatus::Ok,
                    error: None,
                }
            }
            Err(err) => {
                let message = failure_message(&err);
                warn!(error = %message, "Tool failed, reporting to model");
                ToolCallRecord {
                    name,
                    input,
                    output: None,
                    status: ToolStatus::Error,
                    error: Some(message),
                }
            }
        }
    }
}
