//! PostgreSQL implementation of the store traits.

use crate::models::{EpisodeRow, NewArtifact, NewEpisode, SceneRow};
use crate::schema::{artifacts, episodes, projects, scenes};
use async_trait::async_trait;
use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use panelsmith_error::{DatabaseError, PanelsmithResult, StorageError, StorageErrorKind};
use panelsmith_interface::{
    ArtifactStore, ArtifactWrite, EpisodeOperation, EpisodeRecord, EpisodeStore, OperationResult,
    SceneFilter, SceneStore, ShotPromptRow,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, instrument};

/// Store backed by a single PostgreSQL connection.
pub struct PostgresStore {
    conn: Arc<Mutex<PgConnection>>,
}

impl std::fmt::Debug for PostgresStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresStore").finish_non_exhaustive()
    }
}

impl PostgresStore {
    /// Wrap an established connection.
    pub fn new(conn: PgConnection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }
}

fn to_i32(order: u32) -> Result<i32, StorageError> {
    i32::try_from(order).map_err(|_| {
        StorageError::new(StorageErrorKind::Transaction(format!(
            "episode order {} out of range",
            order
        )))
    })
}

fn apply(
    conn: &mut PgConnection,
    project_id: &str,
    operation: &EpisodeOperation,
) -> Result<OperationResult, diesel::result::Error> {
    match operation {
        EpisodeOperation::Upsert(record) => {
            let row = NewEpisode {
                project_id,
                order_no: record.order as i32,
                title: &record.title,
                summary: &record.summary,
                outline: &record.outline,
                updated_at: Utc::now(),
            };
            diesel::insert_into(episodes::table)
                .values(&row)
                .on_conflict((episodes::project_id, episodes::order_no))
                .do_update()
                .set(&row)
                .execute(conn)?;
            Ok(OperationResult::Upserted {
                order: record.order,
            })
        }
        EpisodeOperation::DeleteAfterOrder(bound) => {
            let bound = i32::try_from(*bound).unwrap_or(i32::MAX);
            let count = diesel::delete(
                episodes::table
                    .filter(episodes::project_id.eq(project_id))
                    .filter(episodes::order_no.gt(bound)),
            )
            .execute(conn)?;
            Ok(OperationResult::Deleted { count })
        }
        EpisodeOperation::SetWorkflowState(state) => {
            diesel::update(projects::table.find(project_id))
                .set(projects::workflow_state.eq(state))
                .execute(conn)?;
            Ok(OperationResult::WorkflowStateSet)
        }
    }
}

#[async_trait]
impl EpisodeStore for PostgresStore {
    #[instrument(skip(self, operations), fields(operations = operations.len()))]
    async fn transaction(
        &self,
        project_id: &str,
        operations: Vec<EpisodeOperation>,
    ) -> PanelsmithResult<Vec<OperationResult>> {
        for operation in &operations {
            if let EpisodeOperation::Upsert(record) = operation {
                if record.order == 0 {
                    return Err(StorageError::new(StorageErrorKind::Transaction(
                        "episode order must be positive".to_string(),
                    ))
                    .into());
                }
                to_i32(record.order)?;
            }
        }

        let mut conn = self.conn.lock().await;
        let results = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                diesel::insert_into(projects::table)
                    .values(projects::id.eq(project_id))
                    .on_conflict_do_nothing()
                    .execute(conn)?;
                operations
                    .iter()
                    .map(|operation| apply(conn, project_id, operation))
                    .collect::<Result<Vec<_>, _>>()
            })
            .map_err(|e| {
                error!(error = %e, project_id, "Episode transaction rolled back");
                DatabaseError::from(e)
            })?;

        debug!(results = results.len(), "Committed episode transaction");
        Ok(results)
    }

    async fn list_episodes(&self, project_id: &str) -> PanelsmithResult<Vec<EpisodeRecord>> {
        let mut conn = self.conn.lock().await;
        let rows = episodes::table
            .filter(episodes::project_id.eq(project_id))
            .order(episodes::order_no.asc())
            .load::<EpisodeRow>(&mut *conn)
            .map_err(DatabaseError::from)?;
        Ok(rows.into_iter().map(EpisodeRecord::from).collect())
    }
}

#[async_trait]
impl ArtifactStore for PostgresStore {
    #[instrument(skip(self, write), fields(kind = %write.kind, owner = %write.owner_id))]
    async fn save_artifact(&self, write: ArtifactWrite) -> PanelsmithResult<()> {
        let row = NewArtifact {
            kind: write.kind.as_ref(),
            owner_id: &write.owner_id,
            value: &write.value,
            updated_at: Utc::now(),
        };
        let mut conn = self.conn.lock().await;
        diesel::insert_into(artifacts::table)
            .values(&row)
            .on_conflict((artifacts::kind, artifacts::owner_id))
            .do_update()
            .set(&row)
            .execute(&mut *conn)
            .map_err(DatabaseError::from)?;
        Ok(())
    }
}

#[async_trait]
impl SceneStore for PostgresStore {
    async fn list_shot_prompts(&self, filter: &SceneFilter) -> PanelsmithResult<Vec<ShotPromptRow>> {
        let mut query = scenes::table.order(scenes::id.asc()).into_boxed();
        if let Some(project_id) = filter.project_id() {
            query = query.filter(scenes::project_id.eq(project_id.clone()));
        }
        if *filter.limit() > 0 {
            query = query.limit(*filter.limit() as i64);
        }

        let mut conn = self.conn.lock().await;
        let rows = query
            .load::<SceneRow>(&mut *conn)
            .map_err(DatabaseError::from)?;
        Ok(rows.into_iter().map(ShotPromptRow::from).collect())
    }

    async fn update_shot_prompt(&self, scene_id: &str, shot_prompt: &str) -> PanelsmithResult<()> {
        let mut conn = self.conn.lock().await;
        let updated = diesel::update(scenes::table.find(scene_id))
            .set(scenes::shot_prompt.eq(shot_prompt))
            .execute(&mut *conn)
            .map_err(DatabaseError::from)?;
        if updated == 0 {
            let missing = StorageErrorKind::NotFound(format!("scene {}", scene_id));
            return Err(StorageError::new(missing).into());
        }
        Ok(())
    }
}
