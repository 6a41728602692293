//! Persistence collaborators.
//!
//! Stores are transactional from the caller's point of view: an
//! [`EpisodeStore::transaction`] either applies every operation or none.

use async_trait::async_trait;
use derive_getters::Getters;
use panelsmith_error::PanelsmithResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A planned episode keyed by its order within the project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeRecord {
    /// 1-based order
    pub order: u32,
    /// Episode title
    pub title: String,
    /// One-paragraph summary
    pub summary: String,
    /// Full plan entry as produced by the model
    pub outline: Value,
}

/// One step of an episode transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum EpisodeOperation {
    /// Insert or replace the episode with this order
    Upsert(EpisodeRecord),
    /// Delete every episode whose order is greater than the bound
    DeleteAfterOrder(u32),
    /// Move the project to a workflow state
    SetWorkflowState(String),
}

/// Result of one [`EpisodeOperation`], in the same position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationResult {
    /// Episode written
    Upserted {
        /// Order of the written episode
        order: u32,
    },
    /// Episodes removed
    Deleted {
        /// Number of rows removed
        count: usize,
    },
    /// Workflow state updated
    WorkflowStateSet,
}

/// Episode persistence.
#[async_trait]
pub trait EpisodeStore: Send + Sync {
    /// Apply all operations atomically.
    async fn transaction(
        &self,
        project_id: &str,
        operations: Vec<EpisodeOperation>,
    ) -> PanelsmithResult<Vec<OperationResult>>;

    /// Episodes of a project ordered by `order`.
    async fn list_episodes(&self, project_id: &str) -> PanelsmithResult<Vec<EpisodeRecord>>;
}

/// Kind of generated artifact.
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
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ArtifactKind {
    /// Per-scene sound cues
    SoundDesign,
    /// Per-scene screenplay
    SceneScript,
    /// Project emotion curve
    EmotionArc,
    /// Per-episode scene breakdown
    SceneList,
}

/// A validated artifact to persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactWrite {
    /// What is being written
    pub kind: ArtifactKind,
    /// Scene, episode or project id that owns the artifact
    pub owner_id: String,
    /// The artifact
    pub value: Value,
}

/// Artifact persistence.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Replace the owner's artifact of this kind.
    async fn save_artifact(&self, write: ArtifactWrite) -> PanelsmithResult<()>;
}

/// Which scenes a scan visits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters)]
pub struct SceneFilter {
    /// Restrict to one project
    project_id: Option<String>,
    /// Maximum rows; 0 means unbounded
    limit: usize,
}

impl SceneFilter {
    /// Create a filter.
    pub fn new(project_id: Option<String>, limit: usize) -> Self {
        Self { project_id, limit }
    }
}

/// A scene's stored storyboard prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShotPromptRow {
    /// Scene id
    pub id: String,
    /// Owning project
    pub project_id: String,
    /// Stored prompt text, if any
    pub shot_prompt: Option<String>,
}

/// Scene storyboard persistence.
#[async_trait]
pub trait SceneStore: Send + Sync {
    /// Scenes matching the filter in a stable order.
    async fn list_shot_prompts(&self, filter: &SceneFilter) -> PanelsmithResult<Vec<ShotPromptRow>>;

    /// Replace a scene's storyboard prompt.
    async fn update_shot_prompt(&self, scene_id: &str, shot_prompt: &str) -> PanelsmithResult<()>;
}
