//! Panelsmith - reliability layer for LLM-driven manga pre-production
//!
//! Language models asked for structured JSON return prose, markdown fences,
//! smart quotes, trailing commas and truncated output. Panelsmith turns that
//! into validated, persisted artifacts.
//!
//! # Features
//!
//! - **JSON recovery**: extract and repair the first JSON value in model output
//! - **Fix-retry generation**: one corrective round trip when output fails its contract
//! - **Chunked planning**: long episode plans generated in validated batches
//! - **Agent loop**: budgeted JSON tool calling with a legacy fallback
//! - **Storyboard migration**: idempotent conversion of legacy shot prompts
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use panelsmith::{
//!     Generator, InMemoryStore, OpenAiCompatibleConfig, OpenAiCompatibleDriver, PanelsmithConfig,
//!     SceneBrief,
//! };
//! use std::sync::Arc;
//!
//! let config = PanelsmithConfig::load()?;
//! let driver_config = OpenAiCompatibleConfig::builder()
//!     .provider("deepseek")
//!     .base_url("https://api.deepseek.com")
//!     .api_key(std::env::var("DEEPSEEK_API_KEY")?)
//!     .model("deepseek-chat")
//!     .build()?;
//! let driver = Arc::new(OpenAiCompatibleDriver::new(driver_config)?);
//! let store = Arc::new(InMemoryStore::new());
//! let generator = Generator::new(driver, store.clone(), store, &config);
//!
//! let brief = SceneBrief::builder().scene_id("s1").summary("Rooftop chase").build()?;
//! let output = generator.generate_sound_design(&brief).await?;
//! println!("{} cues", output.cue_count);
//! ```
//!
//! # Cargo Features
//!
//! - `postgres` - PostgreSQL stores via diesel
//!
//! # Architecture
//!
//! - `panelsmith_error` - Error types
//! - `panelsmith_core` - Messages, requests, token usage, tracing setup
//! - `panelsmith_interface` - Driver, contract and store traits
//! - `panelsmith_extraction` - JSON extraction and repair
//! - `panelsmith_config` - Layered configuration
//! - `panelsmith_cache` - System prompt cache
//! - `panelsmith_models` - OpenAI-compatible chat driver
//! - `panelsmith_database` - In-memory and PostgreSQL stores
//! - `panelsmith_agent` - Tool-calling loop
//! - `panelsmith_generation` - Generation protocols and tasks
//! - `panelsmith_migration` - Shot prompt migration
//!
//! This crate (`panelsmith`) re-exports everything for convenience.

pub use panelsmith_agent::*;
pub use panelsmith_cache::*;
pub use panelsmith_config::*;
pub use panelsmith_core::*;
pub use panelsmith_database::*;
pub use panelsmith_error::*;
pub use panelsmith_extraction::*;
pub use panelsmith_generation::*;
pub use panelsmith_interface::*;
pub use panelsmith_migration::*;
pub use panelsmith_models::*;
