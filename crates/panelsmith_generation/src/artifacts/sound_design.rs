use super::{ArtifactRules, check_range, check_text};
use serde::{Deserialize, Serialize};

const MAX_CUE_MS: u64 = 600_000;

/// Kind of sound cue.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SoundCueType {
    /// Sound effect
    Sfx,
    /// Background music
    Bgm,
    /// Room tone or environment bed
    Ambience,
    /// Synced everyday sounds
    Foley,
    /// Narration
    VoiceOver,
    /// Deliberate silence
    Silence,
}

/// One cue in a scene's sound design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundCue {
    /// Cue id, unique within the scene
    pub id: String,
    /// Cue kind
    #[serde(rename = "type")]
    pub cue_type: SoundCueType,
    /// What is heard
    pub description: String,
    /// Offset from scene start
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_ms: Option<u64>,
    /// Length of the cue
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Relative level, 0 to 1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    /// Fade-in length in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fade_in: Option<u64>,
    /// Fade-out length in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fade_out: Option<u64>,
    /// Free-form intensity, e.g. "subtle"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<String>,
}

impl SoundCue {
    pub(crate) fn check_at(&self, path: &str, issues: &mut Vec<String>) {
        check_text(issues, &format!("{}.id", path), &self.id, 1, 100);
        check_text(issues, &format!("{}.description", path), &self.description, 1, 1000);
        for (field, value) in [
            ("startMs", self.start_ms),
            ("durationMs", self.duration_ms),
            ("fadeIn", self.fade_in),
            ("fadeOut", self.fade_out),
        ] {
            if let Some(ms) = value {
                if ms > MAX_CUE_MS {
                    issues.push(format!("{}.{}: must be at most {}", path, field, MAX_CUE_MS));
                }
            }
        }
        if let Some(volume) = self.volume {
            check_range(issues, &format!("{}.volume", path), volume, 0.0, 1.0);
        }
    }
}

/// Sound design of one scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneSoundDesign {
    /// Cues in play order
    pub cues: Vec<SoundCue>,
    /// Overall mood
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_mood: Option<String>,
}

impl ArtifactRules for SceneSoundDesign {
    fn check(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.cues.is_empty() {
            issues.push("cues: must not be empty".to_string());
        }
        for (i, cue) in self.cues.iter().enumerate() {
            cue.check_at(&format!("cues[{}]", i), &mut issues);
        }
        let mut ids: Vec<&str> = self.cues.iter().map(|cue| cue.id.as_str()).collect();
        ids.sort_unstable();
        if ids.windows(2).any(|pair| pair[0] == pair[1]) {
            issues.push("cues: ids must be unique".to_string());
        }
        issues
    }
}
