//! Loop budgets.

use derive_builder::Builder;
use derive_getters::Getters;
use panelsmith_config::AgentSettings;
use serde::{Deserialize, Serialize};

const DEFAULT_MAX_STEPS: u32 = 6;
const DEFAULT_STEP_TIMEOUT_MS: u64 = 45_000;
const DEFAULT_TOTAL_TIMEOUT_MS: u64 = 180_000;

/// Budgets and fallback switch for a [`ToolLoop`](crate::ToolLoop).
///
/// Zero values mean "use the default".
///
/// # Examples
///
/// ```
/// use panelsmith_agent::AgentLoopConfig;
///
/// let config = AgentLoopConfig::builder().max_steps(2u32).build().unwrap();
/// assert_eq!(*config.max_steps(), 2);
/// assert_eq!(*config.step_timeout_ms(), 45_000);
/// assert!(*config.fallback_enabled());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Getters, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
pub struct AgentLoopConfig {
    /// Model calls allowed
    #[builder(default = "DEFAULT_MAX_STEPS")]
    max_steps: u32,
    /// Time limit for one model call or tool execution
    #[builder(default = "DEFAULT_STEP_TIMEOUT_MS")]
    step_timeout_ms: u64,
    /// Wall-clock budget for the whole loop
    #[builder(default = "DEFAULT_TOTAL_TIMEOUT_MS")]
    total_timeout_ms: u64,
    /// Run the legacy fallback when the loop cannot finish
    #[builder(default = "true")]
    fallback_enabled: bool,
    /// Output token limit for each model call
    #[builder(default)]
    max_tokens: Option<u32>,
}

impl Default for AgentLoopConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            step_timeout_ms: DEFAULT_STEP_TIMEOUT_MS,
            total_timeout_ms: DEFAULT_TOTAL_TIMEOUT_MS,
            fallback_enabled: true,
            max_tokens: None,
        }
    }
}

impl AgentLoopConfig {
    /// Create a builder.
    pub fn builder() -> AgentLoopConfigBuilder {
        AgentLoopConfigBuilder::default()
    }

    /// Budgets from loaded settings.
    pub fn from_settings(settings: &AgentSettings) -> Self {
        Self {
            max_steps: settings.max_steps,
            step_timeout_ms: settings.step_timeout_ms,
            total_timeout_ms: settings.total_timeout_ms,
            fallback_enabled: settings.fallback_to_legacy,
            max_tokens: None,
        }
        .normalized()
    }

    /// Replace zero budgets with defaults.
    pub fn normalized(mut self) -> Self {
        if self.max_steps == 0 {
            self.max_steps = DEFAULT_MAX_STEPS;
        }
        if self.step_timeout_ms == 0 {
            self.step_timeout_ms = DEFAULT_STEP_TIMEOUT_MS;
        }
        if self.total_timeout_ms == 0 {
            self.total_timeout_ms = DEFAULT_TOTAL_TIMEOUT_MS;
        }
        self
    }

    /// Set the per-call output token limit.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}
