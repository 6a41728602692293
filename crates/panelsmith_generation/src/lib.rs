//! Structured generation for panelsmith.
//!
//! Every model-backed task turns free text into a validated artifact through
//! the same single-retry protocol:
//!
//! 1. Call the model with the task prompts
//! 2. Extract and repair JSON of the contract's expected kind
//! 3. Validate against the contract
//! 4. On failure, call once more with a fix prompt showing the raw output
//!
//! Episode planning layers a chunked protocol on top, and the episode
//! creation task wraps the agent loop with its legacy fallback.
//!
//! # Example
//!
//! ```rust,ignore
//! use panelsmith_generation::{Generator, SceneBrief};
//!
//! let generator = Generator::new(driver, store.clone(), store, &config);
//! let brief = SceneBrief::builder()
//!     .scene_id("scene-1")
//!     .summary("Two rivals meet at the harbour")
//!     .build()?;
//! let output = generator.generate_sound_design(&brief).await?;
//! println!("{} cues", output.cue_count);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod artifacts;
mod chunked;
mod contract;
mod episode_agent;
mod generator;
pub mod prompts;
mod protocol;
mod tasks;

pub use artifacts::{
    ArtifactRules, DialogueBlock, EmotionArc, EmotionPoint, EpisodePlanBatch, EpisodePlanEntry,
    SceneList, SceneListItem, SceneScript, SceneSoundDesign, SoundCue, SoundCueType, Transition,
};
pub use chunked::{
    BatchChunk, BatchReport, EPISODE_PLAN_EDITING, EpisodePlanOutput, PlanEpisodesInput,
    PlanEpisodesInputBuilder, batch_ranges,
};
pub use contract::SchemaContract;
pub use episode_agent::{
    AgentStepSummary, EPISODE_CREATION_FALLBACK_REASON, EpisodeContextTool,
    EpisodeCreationOutcome, Proceed,
};
pub use generator::Generator;
pub use protocol::{
    AttemptOutcome, GenerationAttempt, StructuredOutput, StructuredRequest,
    StructuredRequestBuilder, build_fix_prompt, generate_structured,
};
pub use tasks::{
    EmotionArcOutput, SceneBrief, SceneBriefBuilder, SceneListOutput, SceneScriptOutput,
    SoundDesignOutput,
};
