use super::{ArtifactRules, check_text};
use serde::{Deserialize, Serialize};

/// One scene of an episode breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneListItem {
    /// 1-based order within the episode
    pub order: u32,
    /// What happens in the scene
    pub summary: String,
}

/// Scene breakdown of an episode; a top-level JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneList(pub Vec<SceneListItem>);

impl ArtifactRules for SceneList {
    fn check(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.0.is_empty() {
            issues.push("$: must contain at least one scene".to_string());
        }
        for (i, item) in self.0.iter().enumerate() {
            let expected = i as u32 + 1;
            if item.order != expected {
                issues.push(format!("[{}].order: expected {}, got {}", i, expected, item.order));
            }
            check_text(&mut issues, &format!("[{}].summary", i), &item.summary, 1, 1000);
        }
        issues
    }
}
