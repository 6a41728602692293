use super::sound_design::SoundCue;
use super::{ArtifactRules, check_text};
use serde::{Deserialize, Serialize};

/// One line of dialogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueBlock {
    /// Speaker
    pub character: String,
    /// Delivery note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parenthetical: Option<String>,
    /// Spoken text
    pub line: String,
}

/// Transition into the next scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    /// Transition type, e.g. "cut" or "dissolve"
    #[serde(rename = "type")]
    pub transition_type: String,
    /// Length of the transition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Why the transition is used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motivation: Option<String>,
}

/// Screenplay of one scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneScript {
    /// Slug line, e.g. "INT. CAFE - DAY"
    pub scene_heading: String,
    /// Action description lines
    #[serde(default)]
    pub action_lines: Vec<String>,
    /// Dialogue in order
    #[serde(default)]
    pub dialogue_blocks: Vec<DialogueBlock>,
    /// Sound cues written into the script
    #[serde(default)]
    pub sound_cues: Vec<SoundCue>,
    /// Exit transition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition_out: Option<Transition>,
}

impl ArtifactRules for SceneScript {
    fn check(&self) -> Vec<String> {
        let mut issues = Vec::new();
        check_text(&mut issues, "sceneHeading", &self.scene_heading, 1, 200);
        if self.action_lines.is_empty() && self.dialogue_blocks.is_empty() {
            issues.push("actionLines: a scene needs action lines or dialogue".to_string());
        }
        for (i, line) in self.action_lines.iter().enumerate() {
            check_text(&mut issues, &format!("actionLines[{}]", i), line, 1, 1000);
        }
        for (i, block) in self.dialogue_blocks.iter().enumerate() {
            check_text(&mut issues, &format!("dialogueBlocks[{}].character", i), &block.character, 1, 100);
            check_text(&mut issues, &format!("dialogueBlocks[{}].line", i), &block.line, 1, 1000);
        }
        for (i, cue) in self.sound_cues.iter().enumerate() {
            cue.check_at(&format!("soundCues[{}]", i), &mut issues);
        }
        if let Some(transition) = &self.transition_out {
            check_text(&mut issues, "transitionOut.type", &transition.transition_type, 1, 50);
        }
        issues
    }
}
