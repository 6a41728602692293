//! Episode creation agent.
//!
//! Before the legacy episode pipeline runs, an agent may inspect the episode
//! and confirm it is ready to proceed. The agent path is gated by the
//! `episode_creation_enabled` flag and always ends in `{"proceed": true}`,
//! either from the model or from the legacy fallback.

use crate::generator::Generator;
use crate::prompts;
use async_trait::async_trait;
use panelsmith_agent::{
    AgentLoopConfig, AgentTool, AgentTrace, ExecutionMode, FallbackOutcome, LegacyFallback,
    ToolLoop, ToolRegistry,
};
use panelsmith_core::{Message, TokenUsage};
use panelsmith_error::{PanelsmithError, PanelsmithResult};
use panelsmith_interface::EpisodeStore;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Trace reason recorded when the legacy path takes over.
pub const EPISODE_CREATION_FALLBACK_REASON: &str = "episode_creation_agent_failed_use_legacy";

/// Final answer the agent must give.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawProceed")]
pub struct Proceed {
    proceed: bool,
}

impl Proceed {
    /// The only accepted answer.
    pub fn yes() -> Self {
        Self { proceed: true }
    }
}

#[derive(Deserialize)]
struct RawProceed {
    proceed: bool,
}

impl TryFrom<RawProceed> for Proceed {
    type Error = String;

    fn try_from(raw: RawProceed) -> Result<Self, Self::Error> {
        if raw.proceed {
            Ok(Proceed::yes())
        } else {
            Err("Episode creation final must be {\"proceed\": true}".to_string())
        }
    }
}

/// Reads the planned state of one episode.
pub struct EpisodeContextTool {
    episodes: Arc<dyn EpisodeStore>,
    project_id: String,
    episode_order: u32,
}

impl std::fmt::Debug for EpisodeContextTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EpisodeContextTool")
            .field("project_id", &self.project_id)
            .field("episode_order", &self.episode_order)
            .finish_non_exhaustive()
    }
}

impl EpisodeContextTool {
    /// Tool bound to one episode.
    pub fn new(episodes: Arc<dyn EpisodeStore>, project_id: impl Into<String>, episode_order: u32) -> Self {
        Self {
            episodes,
            project_id: project_id.into(),
            episode_order,
        }
    }
}

#[async_trait]
impl AgentTool for EpisodeContextTool {
    fn name(&self) -> &str {
        "read_episode_context"
    }

    fn description(&self) -> &str {
        "Read the current state of the episode being created"
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _input: Value) -> PanelsmithResult<Value> {
        let episodes = self.episodes.list_episodes(&self.project_id).await?;
        let episode = episodes.iter().find(|e| e.order == self.episode_order);
        debug!(found = episode.is_some(), planned = episodes.len(), "Read episode context");

        Ok(json!({
            "projectId": self.project_id,
            "episodeOrder": self.episode_order,
            "found": episode.is_some(),
            "title": episode.map(|e| e.title.as_str()),
            "hasSummary": episode.is_some_and(|e| !e.summary.trim().is_empty()),
            "hasOutline": episode.is_some_and(|e| !e.outline.is_null()),
            "plannedEpisodeCount": episodes.len(),
        }))
    }
}

struct ProceedFallback;

#[async_trait]
impl LegacyFallback<Proceed> for ProceedFallback {
    async fn run(&self, _cause: &PanelsmithError) -> PanelsmithResult<FallbackOutcome<Proceed>> {
        Ok(FallbackOutcome::new(
            Proceed::yes(),
            EPISODE_CREATION_FALLBACK_REASON,
        ))
    }
}

/// One line of the trace for progress displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStepSummary {
    /// Step index
    pub index: u32,
    /// Step kind
    pub kind: String,
    /// `kind` or `kind:tool`
    pub summary: String,
}

/// Result of [`Generator::run_episode_creation_agent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeCreationOutcome {
    /// Owning project
    pub project_id: String,
    /// Episode being created
    pub episode_order: u32,
    /// Path taken
    pub execution_mode: ExecutionMode,
    /// Whether the agent ran and the legacy fallback took over
    pub fallback_used: bool,
    /// Trace of the agent run; absent when the agent is disabled
    pub agent_trace: Option<AgentTrace>,
    /// Condensed trace
    pub agent_steps: Vec<AgentStepSummary>,
    /// Usage of the agent's model calls
    pub token_usage: Option<TokenUsage>,
}

fn summarize_steps(trace: &AgentTrace) -> Vec<AgentStepSummary> {
    trace
        .steps
        .iter()
        .map(|step| {
            let kind = step.kind.to_string();
            let summary = match &step.tool_call {
                Some(call) => format!("{}:{}", kind, call.name),
                None => kind.clone(),
            };
            AgentStepSummary {
                index: step.index,
                kind,
                summary,
            }
        })
        .collect()
}

impl Generator {
    /// Let the agent confirm an episode is ready for the creation pipeline.
    ///
    /// With the agent disabled this returns at once in legacy mode, without a
    /// trace and without calling the model.
    ///
    /// # Errors
    ///
    /// Upstream errors always propagate. Agent failures propagate only when
    /// the legacy fallback is disabled.
    #[instrument(skip(self))]
    pub async fn run_episode_creation_agent(
        &self,
        project_id: &str,
        episode_order: u32,
    ) -> PanelsmithResult<EpisodeCreationOutcome> {
        let settings = self.agent_settings();
        if !settings.episode_creation_enabled {
            debug!("Episode creation agent disabled, using legacy path");
            return Ok(EpisodeCreationOutcome {
                project_id: project_id.to_string(),
                episode_order,
                execution_mode: ExecutionMode::Legacy,
                fallback_used: false,
                agent_trace: None,
                agent_steps: Vec::new(),
                token_usage: None,
            });
        }

        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EpisodeContextTool::new(
            Arc::clone(self.episodes()),
            project_id,
            episode_order,
        )));

        let system = format!(
            "{}\n\nAvailable tools:\n{}",
            self.system_prompt(prompts::EPISODE_CREATION_AGENT_SYSTEM)
                .await?,
            registry.describe()
        );
        let user = [
            "Goal: run the five episode creation stages in order.".to_string(),
            format!("projectId={}", project_id),
            format!("episodeOrder={}", episode_order),
            "Read the context first, then answer with final {\"proceed\": true}.".to_string(),
        ]
        .join("\n");

        let fallback = ProceedFallback;
        let outcome = ToolLoop::<Proceed>::new(
            self.driver(),
            &registry,
            AgentLoopConfig::from_settings(settings),
        )
        .with_fallback(&fallback)
        .run(vec![Message::system(system), Message::user(user)])
        .await?;

        info!(
            mode = %outcome.execution_mode,
            fallback_used = outcome.fallback_used,
            steps = outcome.trace.steps.len(),
            "Episode creation agent finished"
        );
        Ok(EpisodeCreationOutcome {
            project_id: project_id.to_string(),
            episode_order,
            execution_mode: outcome.execution_mode,
            fallback_used: outcome.fallback_used,
            agent_steps: summarize_steps(&outcome.trace),
            agent_trace: Some(outcome.trace),
            token_usage: outcome.token_usage,
        })
    }
}
