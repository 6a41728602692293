use super::{ArtifactRules, check_range};
use serde::{Deserialize, Serialize};

/// One point of the emotion curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionPoint {
    /// Episode the point belongs to
    pub episode_order: u32,
    /// Scene within the episode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_order: Option<u32>,
    /// 0 (calm) to 10 (peak)
    pub tension: f64,
    /// -5 (despair) to 5 (elation)
    pub emotional_valence: f64,
    /// Short label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Story beat at this point
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beat_name: Option<String>,
}

/// Emotion curve across a project's episodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionArc {
    /// Points ordered along the story
    pub points: Vec<EmotionPoint>,
}

impl EmotionArc {
    /// Points of one episode.
    pub fn points_for(&self, episode_order: u32) -> impl Iterator<Item = &EmotionPoint> {
        self.points
            .iter()
            .filter(move |point| point.episode_order == episode_order)
    }
}

impl ArtifactRules for EmotionArc {
    fn check(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.points.is_empty() {
            issues.push("points: must not be empty".to_string());
        }
        for (i, point) in self.points.iter().enumerate() {
            if point.episode_order == 0 {
                issues.push(format!("points[{}].episodeOrder: must be at least 1", i));
            }
            check_range(&mut issues, &format!("points[{}].tension", i), point.tension, 0.0, 10.0);
            check_range(
                &mut issues,
                &format!("points[{}].emotionalValence", i),
                point.emotional_valence,
                -5.0,
                5.0,
            );
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_out_of_range_values() {
        let arc: EmotionArc = serde_json::from_value(json!({
            "points": [
                { "episodeOrder": 1, "tension": 2, "emotionalValence": 1, "label": "Setup" },
                { "episodeOrder": 2, "sceneOrder": 4, "tension": 11, "emotionalValence": -6 }
            ]
        }))
        .unwrap();

        assert_eq!(
            arc.check(),
            vec![
                "points[1].tension: must be between 0 and 10".to_string(),
                "points[1].emotionalValence: must be between -5 and 5".to_string(),
            ]
        );
        assert_eq!(arc.points_for(2).count(), 1);
    }
}
