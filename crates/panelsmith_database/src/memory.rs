//! In-memory implementation of the store traits for testing.
//!
//! Keeps episodes, workflow states, artifacts and scenes in maps protected by a
//! single `RwLock`. All data is lost when the store is dropped.

use async_trait::async_trait;
use panelsmith_error::{PanelsmithResult, StorageError, StorageErrorKind};
use panelsmith_interface::{
    ArtifactKind, ArtifactStore, ArtifactWrite, EpisodeOperation, EpisodeRecord, EpisodeStore,
    OperationResult, SceneFilter, SceneStore, ShotPromptRow,
};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Internal state; cloned for each transaction and swapped in on success.
#[derive(Debug, Clone, Default)]
struct State {
    episodes: HashMap<String, BTreeMap<u32, EpisodeRecord>>,
    workflow_states: HashMap<String, String>,
    artifacts: HashMap<(ArtifactKind, String), Value>,
    scenes: BTreeMap<String, ShotPromptRow>,
    scene_updates: usize,
}

/// In-memory store for episodes, artifacts and scenes.
///
/// # Example
/// ```
/// use panelsmith_database::InMemoryStore;
/// use panelsmith_interface::{EpisodeOperation, EpisodeStore};
///
/// # tokio_test::block_on(async {
/// let store = InMemoryStore::new();
/// store
///     .transaction("p1", vec![EpisodeOperation::SetWorkflowState("DRAFT".into())])
///     .await
///     .unwrap();
/// assert_eq!(store.workflow_state("p1").await.as_deref(), Some("DRAFT"));
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a scene row.
    pub async fn insert_scene(&self, row: ShotPromptRow) {
        self.state.write().await.scenes.insert(row.id.clone(), row);
    }

    /// Current stored prompt of a scene.
    pub async fn shot_prompt(&self, scene_id: &str) -> Option<String> {
        self.state
            .read()
            .await
            .scenes
            .get(scene_id)
            .and_then(|row| row.shot_prompt.clone())
    }

    /// Number of `update_shot_prompt` calls that reached the store.
    pub async fn scene_update_count(&self) -> usize {
        self.state.read().await.scene_updates
    }

    /// Workflow state of a project, if one was ever set.
    pub async fn workflow_state(&self, project_id: &str) -> Option<String> {
        self.state
            .read()
            .await
            .workflow_states
            .get(project_id)
            .cloned()
    }

    /// Stored artifact for an owner.
    pub async fn artifact(&self, kind: ArtifactKind, owner_id: &str) -> Option<Value> {
        self.state
            .read()
            .await
            .artifacts
            .get(&(kind, owner_id.to_string()))
            .cloned()
    }

    /// Clear all data (for testing).
    pub async fn clear(&self) {
        *self.state.write().await = State::default();
    }
}

fn apply(
    state: &mut State,
    project_id: &str,
    operation: EpisodeOperation,
) -> Result<OperationResult, StorageError> {
    match operation {
        EpisodeOperation::Upsert(record) => {
            if record.order == 0 {
                return Err(StorageError::new(StorageErrorKind::Transaction(
                    "episode order must be positive".to_string(),
                )));
            }
            let order = record.order;
            state
                .episodes
                .entry(project_id.to_string())
                .or_default()
                .insert(order, record);
            Ok(OperationResult::Upserted { order })
        }
        EpisodeOperation::DeleteAfterOrder(bound) => {
            let count = match state.episodes.get_mut(project_id) {
                Some(episodes) => {
                    let removed = episodes.split_off(&(bound.saturating_add(1)));
                    removed.len()
                }
                None => 0,
            };
            Ok(OperationResult::Deleted { count })
        }
        EpisodeOperation::SetWorkflowState(workflow_state) => {
            state
                .workflow_states
                .insert(project_id.to_string(), workflow_state);
            Ok(OperationResult::WorkflowStateSet)
        }
    }
}

#[async_trait]
impl EpisodeStore for InMemoryStore {
    #[instrument(skip(self, operations), fields(operations = operations.len()))]
    async fn transaction(
        &self,
        project_id: &str,
        operations: Vec<EpisodeOperation>,
    ) -> PanelsmithResult<Vec<OperationResult>> {
        let mut guard = self.state.write().await;
        let mut working = guard.clone();

        let mut results = Vec::with_capacity(operations.len());
        for operation in operations {
            results.push(apply(&mut working, project_id, operation)?);
        }

        *guard = working;
        debug!(results = results.len(), "Committed episode transaction");
        Ok(results)
    }

    async fn list_episodes(&self, project_id: &str) -> PanelsmithResult<Vec<EpisodeRecord>> {
        Ok(self
            .state
            .read()
            .await
            .episodes
            .get(project_id)
            .map(|episodes| episodes.values().cloned().collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl ArtifactStore for InMemoryStore {
    async fn save_artifact(&self, write: ArtifactWrite) -> PanelsmithResult<()> {
        debug!(kind = %write.kind, owner = %write.owner_id, "Saving artifact");
        self.state
            .write()
            .await
            .artifacts
            .insert((write.kind, write.owner_id), write.value);
        Ok(())
    }
}

#[async_trait]
impl SceneStore for InMemoryStore {
    async fn list_shot_prompts(&self, filter: &SceneFilter) -> PanelsmithResult<Vec<ShotPromptRow>> {
        let state = self.state.read().await;
        let matching = state.scenes.values().filter(|row| match filter.project_id() {
            Some(project_id) => &row.project_id == project_id,
            None => true,
        });
        let rows = if *filter.limit() > 0 {
            matching.take(*filter.limit()).cloned().collect()
        } else {
            matching.cloned().collect()
        };
        Ok(rows)
    }

    async fn update_shot_prompt(&self, scene_id: &str, shot_prompt: &str) -> PanelsmithResult<()> {
        let mut state = self.state.write().await;
        let row = state.scenes.get_mut(scene_id).ok_or_else(|| {
            StorageError::new(StorageErrorKind::NotFound(format!("scene {}", scene_id)))
        })?;
        row.shot_prompt = Some(shot_prompt.to_string());
        state.scene_updates += 1;
        Ok(())
    }
}
