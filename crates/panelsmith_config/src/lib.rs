//! Layered configuration for panelsmith.
//!
//! Sources, later ones winning:
//! - bundled `panelsmith.toml`
//! - `~/.config/panelsmith/panelsmith.toml`
//! - `./panelsmith.toml`
//! - `PANELSMITH__SECTION__KEY` environment variables
//! - the worker's `AI_AGENT_*` and `AI_REQUEST_TIMEOUT_MS` variables

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod settings;

pub use settings::{
    AgentSettings, GenerationSettings, PanelsmithConfig, PromptSettings, ProviderSettings,
    RequestSettings, parse_flag,
};
