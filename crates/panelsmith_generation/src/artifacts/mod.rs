//! Typed artifacts and their structural rules.

mod emotion_arc;
mod episode_plan;
mod scene_list;
mod scene_script;
mod sound_design;

pub use emotion_arc::{EmotionArc, EmotionPoint};
pub use episode_plan::{EpisodePlanBatch, EpisodePlanEntry};
pub use scene_list::{SceneList, SceneListItem};
pub use scene_script::{DialogueBlock, SceneScript, Transition};
pub use sound_design::{SceneSoundDesign, SoundCue, SoundCueType};

/// Rules a deserialized artifact must satisfy beyond its shape.
pub trait ArtifactRules {
    /// One `path: message` entry per violation; empty when valid.
    fn check(&self) -> Vec<String>;
}

/// Require a string whose character count is within `min..=max`.
pub(crate) fn check_text(issues: &mut Vec<String>, path: &str, value: &str, min: usize, max: usize) {
    let len = value.trim().chars().count();
    if len < min {
        issues.push(format!("{}: must not be empty", path));
    } else if value.chars().count() > max {
        issues.push(format!("{}: must be at most {} characters", path, max));
    }
}

/// Require a number within `min..=max`.
pub(crate) fn check_range(issues: &mut Vec<String>, path: &str, value: f64, min: f64, max: f64) {
    if !(min..=max).contains(&value) {
        issues.push(format!("{}: must be between {} and {}", path, min, max));
    }
}
