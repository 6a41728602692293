//! Single-artifact generation tasks.
//!
//! Each task resolves its prompts, runs [`generate_structured`](crate::generate_structured)
//! with a [`SchemaContract`], persists the artifact and returns it with the
//! extracted JSON and merged token usage.

use crate::artifacts::{
    EmotionArc, SceneList, SceneListItem, SceneScript, SceneSoundDesign,
};
use crate::contract::SchemaContract;
use crate::generator::Generator;
use crate::prompts::{self, JSON_RULES};
use derive_builder::Builder;
use panelsmith_core::TokenUsage;
use panelsmith_error::{PanelsmithResult, StorageError, StorageErrorKind};
use panelsmith_interface::{ArtifactKind, EpisodeRecord};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

const SOUND_DESIGN_MAX_TOKENS: u32 = 4000;
const SCENE_SCRIPT_MAX_TOKENS: u32 = 6000;
const EMOTION_ARC_MAX_TOKENS: u32 = 6000;
const SCENE_LIST_MAX_TOKENS: u32 = 4000;

/// What a scene-level task knows about its scene.
///
/// # Examples
///
/// ```
/// use panelsmith_generation::SceneBrief;
///
/// let brief = SceneBrief::builder()
///     .scene_id("scene-7")
///     .summary("Rooftop chase in the rain")
///     .characters(vec!["Aoi".to_string()])
///     .build()
///     .unwrap();
/// assert!(brief.mood.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[builder(setter(into))]
#[serde(rename_all = "camelCase")]
pub struct SceneBrief {
    /// Scene id; artifacts are stored under it
    pub scene_id: String,
    /// What happens in the scene
    pub summary: String,
    /// Characters on screen
    #[builder(default)]
    #[serde(default)]
    pub characters: Vec<String>,
    /// Intended mood
    #[builder(default, setter(strip_option))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    /// Location description
    #[builder(default, setter(strip_option))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Approximate running time
    #[builder(default, setter(strip_option))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl SceneBrief {
    /// Create a builder.
    pub fn builder() -> SceneBriefBuilder {
        SceneBriefBuilder::default()
    }

    fn describe(&self) -> String {
        let mut lines = vec![
            format!("Scene id: {}", self.scene_id),
            format!("Summary: {}", self.summary),
        ];
        if !self.characters.is_empty() {
            lines.push(format!("Characters: {}", self.characters.join(", ")));
        }
        if let Some(location) = &self.location {
            lines.push(format!("Location: {}", location));
        }
        if let Some(mood) = &self.mood {
            lines.push(format!("Mood: {}", mood));
        }
        if let Some(duration) = self.duration_ms {
            lines.push(format!("Approximate duration: {}ms", duration));
        }
        lines.join("\n")
    }
}

/// Result of [`Generator::generate_sound_design`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundDesignOutput {
    /// Scene the design belongs to
    pub scene_id: String,
    /// Number of cues
    pub cue_count: usize,
    /// The design
    pub sound_design: SceneSoundDesign,
    /// JSON text the design was parsed from
    pub extracted_json: String,
    /// Usage of both attempts
    pub token_usage: Option<TokenUsage>,
    /// Whether the fix attempt was needed
    pub fixed: bool,
}

/// Result of [`Generator::generate_scene_script`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneScriptOutput {
    /// Scene the script belongs to
    pub scene_id: String,
    /// The script
    pub scene_script: SceneScript,
    /// JSON text the script was parsed from
    pub extracted_json: String,
    /// Usage of both attempts
    pub token_usage: Option<TokenUsage>,
    /// Whether the fix attempt was needed
    pub fixed: bool,
}

/// Result of [`Generator::generate_emotion_arc`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionArcOutput {
    /// Project the arc belongs to
    pub project_id: String,
    /// Number of points
    pub point_count: usize,
    /// The arc
    pub emotion_arc: EmotionArc,
    /// JSON text the arc was parsed from
    pub extracted_json: String,
    /// Usage of both attempts
    pub token_usage: Option<TokenUsage>,
    /// Whether the fix attempt was needed
    pub fixed: bool,
}

/// Result of [`Generator::generate_scene_list`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneListOutput {
    /// Owning project
    pub project_id: String,
    /// Episode the scenes belong to
    pub episode_order: u32,
    /// Number of scenes
    pub scene_count: usize,
    /// Scenes in order
    pub scenes: Vec<SceneListItem>,
    /// JSON text the list was parsed from
    pub extracted_json: String,
    /// Usage of both attempts
    pub token_usage: Option<TokenUsage>,
    /// Whether the fix attempt was needed
    pub fixed: bool,
}

fn episode_digest(episode: &EpisodeRecord) -> String {
    format!("Episode {}: {} | {}", episode.order, episode.title, episode.summary)
}

fn episode_owner(project_id: &str, order: u32) -> String {
    format!("{}:episode:{}", project_id, order)
}

impl Generator {
    /// Design the sound of one scene.
    ///
    /// # Errors
    ///
    /// Fails when both attempts are rejected, on upstream errors, or when the
    /// artifact cannot be saved.
    #[instrument(skip(self, brief), fields(scene_id = %brief.scene_id))]
    pub async fn generate_sound_design(
        &self,
        brief: &SceneBrief,
    ) -> PanelsmithResult<SoundDesignOutput> {
        let contract = SchemaContract::<SceneSoundDesign>::object("scene_sound_design")
            .with_hint("cues must be a non-empty array and every cue id must be unique");
        let user_prompt = format!(
            "Design the sound for this scene.\n\n{}\n\n{}",
            brief.describe(),
            JSON_RULES
        );
        let output = self
            .run_structured(
                &contract,
                prompts::SOUND_DESIGN_SYSTEM,
                prompts::SOUND_DESIGN_FIX_SYSTEM,
                user_prompt,
                Some(SOUND_DESIGN_MAX_TOKENS),
            )
            .await?;

        self.save(ArtifactKind::SoundDesign, &brief.scene_id, &output.artifact)
            .await?;
        info!(cues = output.artifact.cues.len(), fixed = output.fixed, "Sound design generated");
        Ok(SoundDesignOutput {
            scene_id: brief.scene_id.clone(),
            cue_count: output.artifact.cues.len(),
            sound_design: output.artifact,
            extracted_json: output.extracted_json,
            token_usage: output.token_usage,
            fixed: output.fixed,
        })
    }

    /// Write the screenplay of one scene.
    ///
    /// # Errors
    ///
    /// Fails when both attempts are rejected, on upstream errors, or when the
    /// artifact cannot be saved.
    #[instrument(skip(self, brief), fields(scene_id = %brief.scene_id))]
    pub async fn generate_scene_script(
        &self,
        brief: &SceneBrief,
    ) -> PanelsmithResult<SceneScriptOutput> {
        let contract = SchemaContract::<SceneScript>::object("scene_script")
            .with_hint("sceneHeading must be non-empty and every dialogue block needs character and line");
        let user_prompt = format!(
            "Write the screenplay for this scene.\n\n{}\n\n{}",
            brief.describe(),
            JSON_RULES
        );
        let output = self
            .run_structured(
                &contract,
                prompts::SCENE_SCRIPT_SYSTEM,
                prompts::SCENE_SCRIPT_FIX_SYSTEM,
                user_prompt,
                Some(SCENE_SCRIPT_MAX_TOKENS),
            )
            .await?;

        self.save(ArtifactKind::SceneScript, &brief.scene_id, &output.artifact)
            .await?;
        info!(fixed = output.fixed, "Scene script generated");
        Ok(SceneScriptOutput {
            scene_id: brief.scene_id.clone(),
            scene_script: output.artifact,
            extracted_json: output.extracted_json,
            token_usage: output.token_usage,
            fixed: output.fixed,
        })
    }

    /// Chart the emotional curve across a project's planned episodes.
    ///
    /// # Errors
    ///
    /// Fails with a not-found storage error when the project has no episodes,
    /// and otherwise as [`Generator::generate_sound_design`].
    #[instrument(skip(self))]
    pub async fn generate_emotion_arc(&self, project_id: &str) -> PanelsmithResult<EmotionArcOutput> {
        let episodes = self.episodes().list_episodes(project_id).await?;
        if episodes.is_empty() {
            return Err(StorageError::new(StorageErrorKind::NotFound(format!(
                "episodes of project {}",
                project_id
            )))
            .into());
        }

        let digest: Vec<String> = episodes.iter().map(episode_digest).collect();
        let contract = SchemaContract::<EmotionArc>::object("emotion_arc")
            .with_hint("tension must be 0 to 10 and emotionalValence -5 to 5");
        let user_prompt = format!(
            "Chart the emotion arc of these {} episodes, at least one point per episode.\n\n{}\n\n{}",
            episodes.len(),
            digest.join("\n"),
            JSON_RULES
        );
        let output = self
            .run_structured(
                &contract,
                prompts::EMOTION_ARC_SYSTEM,
                prompts::EMOTION_ARC_FIX_SYSTEM,
                user_prompt,
                Some(EMOTION_ARC_MAX_TOKENS),
            )
            .await?;

        self.save(ArtifactKind::EmotionArc, project_id, &output.artifact)
            .await?;
        info!(points = output.artifact.points.len(), fixed = output.fixed, "Emotion arc generated");
        Ok(EmotionArcOutput {
            project_id: project_id.to_string(),
            point_count: output.artifact.points.len(),
            emotion_arc: output.artifact,
            extracted_json: output.extracted_json,
            token_usage: output.token_usage,
            fixed: output.fixed,
        })
    }

    /// Break one planned episode into scenes.
    ///
    /// The model must answer with a top-level JSON array.
    ///
    /// # Errors
    ///
    /// Fails with a not-found storage error when the episode is not planned,
    /// and otherwise as [`Generator::generate_sound_design`].
    #[instrument(skip(self))]
    pub async fn generate_scene_list(
        &self,
        project_id: &str,
        episode_order: u32,
    ) -> PanelsmithResult<SceneListOutput> {
        let episode = self
            .episodes()
            .list_episodes(project_id)
            .await?
            .into_iter()
            .find(|e| e.order == episode_order)
            .ok_or_else(|| {
                StorageError::new(StorageErrorKind::NotFound(format!(
                    "episode {} of project {}",
                    episode_order, project_id
                )))
            })?;

        let contract = SchemaContract::<SceneList>::array("scene_list")
            .with_hint("orders must start at 1 and increase by one");
        let user_prompt = format!(
            "Break this episode into scenes.\n\n{}\nOutline: {}\n\n{}",
            episode_digest(&episode),
            episode.outline,
            JSON_RULES
        );
        let output = self
            .run_structured(
                &contract,
                prompts::SCENE_LIST_SYSTEM,
                prompts::SCENE_LIST_FIX_SYSTEM,
                user_prompt,
                Some(SCENE_LIST_MAX_TOKENS),
            )
            .await?;

        let owner = episode_owner(project_id, episode_order);
        self.save(ArtifactKind::SceneList, &owner, &output.artifact)
            .await?;
        let scenes = output.artifact.0;
        info!(scenes = scenes.len(), fixed = output.fixed, "Scene list generated");
        Ok(SceneListOutput {
            project_id: project_id.to_string(),
            episode_order,
            scene_count: scenes.len(),
            scenes,
            extracted_json: output.extracted_json,
            token_usage: output.token_usage,
            fixed: output.fixed,
        })
    }
}
