//! The 3x3 storyboard prompt format.
//!
//! Fields the converter does not write are kept in `extra` maps, so an
//! already-migrated prompt survives a round trip unchanged.

use crate::shot::{SHOT_ORDER, ShotType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Character, environment, lighting and mood shared by every panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualAnchor {
    /// Character appearance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character: Option<String>,
    /// Environment anchors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    /// Lighting rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lighting: Option<String>,
    /// Overall mood
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    /// Unrecognised fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Grid layout and global style.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoryboardConfig {
    /// Always `3x3_grid` when converted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    /// Frame aspect ratio
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    /// Style preset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Cross-panel consistency anchors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_anchor: Option<VisualAnchor>,
    /// Unrecognised fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One panel of the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryboardShot {
    /// Panel label, `分镜1` to `分镜9`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shot_number: Option<String>,
    /// Shot type fixed by position
    #[serde(rename = "type")]
    pub shot_type: ShotType,
    /// Chinese shot type label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_cn: Option<String>,
    /// What the panel shows
    pub description: String,
    /// Camera angle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<String>,
    /// Narrative focus
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<String>,
    /// Unrecognised fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Rendering constraints for the image model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechnicalRequirements {
    /// Cross-panel consistency rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consistency: Option<String>,
    /// Labelling and framing rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composition: Option<String>,
    /// Quality keywords, with negative prompt when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    /// Unrecognised fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A storyboard prompt in the 3x3 grid format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryboardPromptV2 {
    /// Layout and anchors
    pub storyboard_config: StoryboardConfig,
    /// Nine panels in [`SHOT_ORDER`]
    pub shots: Vec<StoryboardShot>,
    /// Rendering constraints
    pub technical_requirements: TechnicalRequirements,
    /// Unrecognised fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Whether `value` already has the grid shape.
///
/// Requires `storyboard_config` and `technical_requirements` objects and
/// exactly nine shots whose `type` follows [`SHOT_ORDER`] and whose
/// `description` is a string.
///
/// # Examples
///
/// ```
/// use panelsmith_migration::is_storyboard_prompt_v2;
/// use serde_json::json;
///
/// assert!(!is_storyboard_prompt_v2(&json!({ "keyframes": {} })));
/// ```
pub fn is_storyboard_prompt_v2(value: &Value) -> bool {
    let Some(object) = value.as_object() else {
        return false;
    };
    let config_ok = object.get("storyboard_config").is_some_and(Value::is_object);
    let requirements_ok = object
        .get("technical_requirements")
        .is_some_and(Value::is_object);
    let Some(shots) = object.get("shots").and_then(Value::as_array) else {
        return false;
    };
    if !config_ok || !requirements_ok || shots.len() != SHOT_ORDER.len() {
        return false;
    }
    shots.iter().zip(SHOT_ORDER).all(|(shot, expected)| {
        shot.get("type").and_then(Value::as_str) == Some(expected.as_ref())
            && shot.get("description").is_some_and(Value::is_string)
    })
}
