//! Configuration structures.

use config::{Config, Environment, File, FileFormat};
use panelsmith_error::{ConfigError, PanelsmithError, PanelsmithResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, instrument, warn};

const DEFAULT_CONFIG: &str = include_str!("../panelsmith.toml");

/// Model request settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RequestSettings {
    /// Per-call timeout for model requests
    pub timeout_ms: u64,
}

/// Generation protocol settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GenerationSettings {
    /// Episodes requested per model call
    pub episode_batch_size: u32,
    /// Target used when a request names none
    pub default_episode_count: u32,
    /// Upper bound on planned episodes
    pub max_episode_count: u32,
}

/// Agent loop budget and feature flags.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AgentSettings {
    /// Model calls allowed per loop
    pub max_steps: u32,
    /// Time limit for one model call or tool execution
    pub step_timeout_ms: u64,
    /// Wall-clock budget for the whole loop
    pub total_timeout_ms: u64,
    /// Run the legacy path when the agent cannot finish
    pub fallback_to_legacy: bool,
    /// Run the episode-creation agent before legacy generation
    pub episode_creation_enabled: bool,
    /// Agent-driven character expansion
    pub character_expansion_enabled: bool,
    /// Agent-driven narrative phases 3 and 4
    pub narrative_phase34_enabled: bool,
    /// Supervisor agent over multi-step workflows
    pub supervisor_enabled: bool,
}

/// System prompt cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PromptSettings {
    /// Seconds a fetched prompt stays cached
    pub ttl_secs: u64,
}

/// One OpenAI-compatible provider profile.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProviderSettings {
    /// API base URL, with or without a trailing `/v1`
    pub base_url: String,
    /// Model identifier
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Output token cap
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Top-level panelsmith configuration.
///
/// # Example
///
/// ```no_run
/// use panelsmith_config::PanelsmithConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = PanelsmithConfig::load()?;
/// println!("agent max steps: {}", config.agent.max_steps);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PanelsmithConfig {
    /// Model request settings
    pub request: RequestSettings,
    /// Generation protocol settings
    pub generation: GenerationSettings,
    /// Agent loop settings
    pub agent: AgentSettings,
    /// Prompt cache settings
    pub prompts: PromptSettings,
    /// Provider profiles by name
    #[serde(default)]
    pub providers: HashMap<String, ProviderSettings>,
}

impl PanelsmithConfig {
    /// Bundled defaults only.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled file does not deserialize.
    pub fn defaults() -> PanelsmithResult<Self> {
        build(Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml)))
    }

    /// Load configuration from a specific file layered over the bundled defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> PanelsmithResult<Self> {
        debug!("Loading configuration from file");

        build(
            Config::builder()
                .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
                .add_source(File::from(path.as_ref())),
        )
    }

    /// Load configuration from every source, then apply worker environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if any present source fails to parse.
    #[instrument]
    pub fn load() -> PanelsmithResult<Self> {
        debug!("Loading configuration with precedence: env > current dir > home dir > bundled");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/panelsmith/panelsmith.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder
            .add_source(File::with_name("panelsmith").required(false))
            .add_source(
                Environment::with_prefix("PANELSMITH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut config = build(builder)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply the worker's flat environment variables.
    ///
    /// Unparseable values are ignored with a warning.
    ///
    /// # Examples
    ///
    /// ```
    /// use panelsmith_config::PanelsmithConfig;
    ///
    /// let mut config = PanelsmithConfig::defaults().unwrap();
    /// config.apply_env_overrides(|key| match key {
    ///     "AI_AGENT_MAX_STEPS" => Some("3".to_string()),
    ///     "AI_AGENT_FALLBACK_TO_LEGACY" => Some("off".to_string()),
    ///     _ => None,
    /// });
    /// assert_eq!(config.agent.max_steps, 3);
    /// assert!(!config.agent.fallback_to_legacy);
    /// ```
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let flags: [(&str, &mut bool); 5] = [
            (
                "AI_AGENT_CHARACTER_EXPANSION_ENABLED",
                &mut self.agent.character_expansion_enabled,
            ),
            (
                "AI_AGENT_NARRATIVE_PHASE34_ENABLED",
                &mut self.agent.narrative_phase34_enabled,
            ),
            ("AI_AGENT_SUPERVISOR_ENABLED", &mut self.agent.supervisor_enabled),
            (
                "AI_AGENT_EPISODE_CREATION_ENABLED",
                &mut self.agent.episode_creation_enabled,
            ),
            ("AI_AGENT_FALLBACK_TO_LEGACY", &mut self.agent.fallback_to_legacy),
        ];
        for (key, slot) in flags {
            if let Some(raw) = lookup(key) {
                match parse_flag(&raw) {
                    Some(value) => *slot = value,
                    None => warn!(key, value = %raw, "Ignoring unrecognised boolean"),
                }
            }
        }

        if let Some(steps) = positive(&lookup, "AI_AGENT_MAX_STEPS") {
            self.agent.max_steps = steps as u32;
        }
        if let Some(ms) = positive(&lookup, "AI_AGENT_STEP_TIMEOUT_MS") {
            self.agent.step_timeout_ms = ms;
        }
        if let Some(ms) = positive(&lookup, "AI_AGENT_TOTAL_TIMEOUT_MS") {
            self.agent.total_timeout_ms = ms;
        }
        if let Some(ms) = positive(&lookup, "AI_REQUEST_TIMEOUT_MS") {
            self.request.timeout_ms = ms;
        }
    }

    /// Provider profile by name.
    pub fn provider(&self, name: &str) -> Option<&ProviderSettings> {
        self.providers.get(name)
    }
}

/// Parse a boolean flag value.
///
/// Accepts `1/true/yes/on` and `0/false/no/off`, case-insensitive.
///
/// # Examples
///
/// ```
/// use panelsmith_config::parse_flag;
///
/// assert_eq!(parse_flag(" YES "), Some(true));
/// assert_eq!(parse_flag("0"), Some(false));
/// assert_eq!(parse_flag("maybe"), None);
/// ```
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn positive(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Some(value),
        _ => {
            warn!(key, value = %raw, "Ignoring non-positive integer");
            None
        }
    }
}

fn build(builder: config::ConfigBuilder<config::builder::DefaultState>) -> PanelsmithResult<PanelsmithConfig> {
    builder
        .build()
        .map_err(|e| {
            PanelsmithError::from(ConfigError::new(format!(
                "Failed to build configuration: {}",
                e
            )))
        })?
        .try_deserialize()
        .map_err(|e| {
            PanelsmithError::from(ConfigError::new(format!(
                "Failed to parse configuration: {}",
                e
            )))
        })
}
