//! Shared context of every generation task.

use crate::prompts::PromptKey;
use crate::protocol::{StructuredOutput, StructuredRequest, generate_structured};
use panelsmith_cache::{PromptCache, PromptCacheConfig, SystemPrompts};
use panelsmith_config::{AgentSettings, GenerationSettings, PanelsmithConfig};
use panelsmith_error::{JsonError, PanelsmithResult};
use panelsmith_interface::{
    ArtifactKind, ArtifactStore, ArtifactWrite, Contract, EpisodeStore, ModelDriver, PromptSource,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Runs generation tasks against one driver and one set of stores.
///
/// The system prompt cache is owned by the generator; call
/// [`Generator::invalidate_prompt`] or [`Generator::reset_prompts`] after
/// editing overrides.
pub struct Generator {
    driver: Arc<dyn ModelDriver>,
    episodes: Arc<dyn EpisodeStore>,
    artifacts: Arc<dyn ArtifactStore>,
    prompts: Mutex<SystemPrompts>,
    generation: GenerationSettings,
    agent: AgentSettings,
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("provider", &self.driver.provider_name())
            .field("model", &self.driver.model_name())
            .field("generation", &self.generation)
            .field("agent", &self.agent)
            .finish_non_exhaustive()
    }
}

impl Generator {
    /// Generator with built-in prompts and settings from `config`.
    pub fn new(
        driver: Arc<dyn ModelDriver>,
        episodes: Arc<dyn EpisodeStore>,
        artifacts: Arc<dyn ArtifactStore>,
        config: &PanelsmithConfig,
    ) -> Self {
        Self {
            driver,
            episodes,
            artifacts,
            prompts: Mutex::new(SystemPrompts::defaults_only()),
            generation: config.generation.clone(),
            agent: config.agent.clone(),
        }
    }

    /// Resolve system prompts through `source`, cached for the configured TTL.
    pub fn with_prompt_source(self, source: Arc<dyn PromptSource>, ttl_secs: u64) -> Self {
        let cache = PromptCache::new(PromptCacheConfig::default().with_ttl_secs(ttl_secs));
        self.with_prompts(SystemPrompts::new(source, cache))
    }

    /// Replace the system prompt resolver.
    pub fn with_prompts(mut self, prompts: SystemPrompts) -> Self {
        self.prompts = Mutex::new(prompts);
        self
    }

    /// Override agent settings, e.g. to flip a feature flag.
    pub fn with_agent_settings(mut self, agent: AgentSettings) -> Self {
        self.agent = agent;
        self
    }

    /// Override generation settings.
    pub fn with_generation_settings(mut self, generation: GenerationSettings) -> Self {
        self.generation = generation;
        self
    }

    /// The model driver.
    pub fn driver(&self) -> &dyn ModelDriver {
        self.driver.as_ref()
    }

    /// Episode store.
    pub fn episodes(&self) -> &Arc<dyn EpisodeStore> {
        &self.episodes
    }

    /// Generation settings in effect.
    pub fn generation_settings(&self) -> &GenerationSettings {
        &self.generation
    }

    /// Agent settings in effect.
    pub fn agent_settings(&self) -> &AgentSettings {
        &self.agent
    }

    /// Resolve a system prompt.
    pub async fn system_prompt(&self, key: PromptKey) -> PanelsmithResult<String> {
        self.prompts.lock().await.load(key.key, key.default).await
    }

    /// Drop one cached prompt.
    pub async fn invalidate_prompt(&self, key: &str) -> bool {
        self.prompts.lock().await.invalidate(key)
    }

    /// Drop every cached prompt.
    pub async fn reset_prompts(&self) {
        self.prompts.lock().await.reset();
    }

    /// Resolve both prompts of a task and run the single-retry protocol.
    pub(crate) async fn run_structured<C: Contract>(
        &self,
        contract: &C,
        system: PromptKey,
        fix_system: PromptKey,
        user_prompt: String,
        max_tokens: Option<u32>,
    ) -> PanelsmithResult<StructuredOutput<C::Output>> {
        let request = StructuredRequest {
            system_prompt: self.system_prompt(system).await?,
            user_prompt,
            fix_system_prompt: Some(self.system_prompt(fix_system).await?),
            max_tokens,
        };
        generate_structured(self.driver(), contract, &request).await
    }

    /// Persist an artifact.
    pub(crate) async fn save<T: Serialize>(
        &self,
        kind: ArtifactKind,
        owner_id: &str,
        artifact: &T,
    ) -> PanelsmithResult<()> {
        let value = serde_json::to_value(artifact)
            .map_err(|e| JsonError::new(format!("{} of {}", kind, owner_id), e))?;
        debug!(kind = %kind, owner = owner_id, "Persisting artifact");
        self.artifacts
            .save_artifact(ArtifactWrite {
                kind,
                owner_id: owner_id.to_string(),
                value,
            })
            .await
    }
}
