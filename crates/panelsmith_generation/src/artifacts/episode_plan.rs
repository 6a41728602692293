use super::{ArtifactRules, check_text};
use serde::{Deserialize, Serialize};

/// One planned episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodePlanEntry {
    /// 1-based order within the project
    pub order: u32,
    /// Episode title
    pub title: String,
    /// One-sentence summary
    pub logline: String,
    /// Names from the character roster
    #[serde(default)]
    pub main_characters: Vec<String>,
    /// Story beats in order
    #[serde(default)]
    pub beats: Vec<String>,
    /// Locations and time span covered
    pub scene_scope: String,
    /// Closing hook
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cliffhanger: Option<String>,
}

impl EpisodePlanEntry {
    pub(crate) fn check_at(&self, path: &str, issues: &mut Vec<String>) {
        if self.order == 0 {
            issues.push(format!("{}.order: must be at least 1", path));
        }
        check_text(issues, &format!("{}.title", path), &self.title, 1, 200);
        check_text(issues, &format!("{}.logline", path), &self.logline, 1, 2000);
        check_text(issues, &format!("{}.sceneScope", path), &self.scene_scope, 1, 2000);
        for (i, name) in self.main_characters.iter().enumerate() {
            check_text(issues, &format!("{}.mainCharacters[{}]", path, i), name, 1, 200);
        }
        for (i, beat) in self.beats.iter().enumerate() {
            check_text(issues, &format!("{}.beats[{}]", path, i), beat, 1, 500);
        }
        if let Some(cliffhanger) = &self.cliffhanger {
            check_text(issues, &format!("{}.cliffhanger", path), cliffhanger, 0, 2000);
        }
    }
}

/// One batch of an episode plan as returned by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodePlanBatch {
    /// Order of the first episode in this batch
    pub batch_start_order: u32,
    /// Number of episodes in this batch
    pub batch_count: u32,
    /// Why the season has this shape; first batch only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_brief: Option<String>,
    /// Planned episodes
    pub episodes: Vec<EpisodePlanEntry>,
}

impl ArtifactRules for EpisodePlanBatch {
    fn check(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.episodes.is_empty() {
            issues.push("episodes: must not be empty".to_string());
        }
        for (i, episode) in self.episodes.iter().enumerate() {
            episode.check_at(&format!("episodes[{}]", i), &mut issues);
        }
        if let Some(brief) = &self.reasoning_brief {
            check_text(&mut issues, "reasoningBrief", brief, 0, 2000);
        }
        issues
    }
}
