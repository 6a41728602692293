//! Idempotent migration of legacy storyboard shot prompts.
//!
//! Legacy prompts describe nine keyframes (`KF0` to `KF8`) per scene. The
//! current format is a 3x3 grid with a fixed shot type per panel, shared
//! visual anchors and rendering requirements. [`convert_legacy_shot_prompt_to_v2`]
//! converts one prompt; [`migrate_shot_prompts`] walks a [`SceneStore`] and
//! rewrites every convertible prompt.
//!
//! [`SceneStore`]: panelsmith_interface::SceneStore

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod convert;
mod driver;
mod shot;
mod storyboard;

pub use convert::convert_legacy_shot_prompt_to_v2;
pub use driver::{MigrationMode, MigrationOptions, MigrationStats, migrate_shot_prompts};
pub use shot::{SHOT_ORDER, ShotType, focus_for_index};
pub use storyboard::{
    StoryboardConfig, StoryboardPromptV2, StoryboardShot, TechnicalRequirements, VisualAnchor,
    is_storyboard_prompt_v2,
};
