//! Store behaviour through the collaborator traits.

use panelsmith_database::InMemoryStore;
use panelsmith_interface::{
    ArtifactKind, ArtifactStore, ArtifactWrite, EpisodeOperation, EpisodeRecord, EpisodeStore,
    OperationResult,
};
use serde_json::json;
use std::sync::Arc;

fn episode(order: u32, title: &str) -> EpisodeRecord {
    EpisodeRecord {
        order,
        title: title.to_string(),
        summary: format!("{} summary", title),
        outline: json!({ "order": order, "title": title }),
    }
}

#[tokio::test]
async fn test_replan_replaces_and_truncates_episodes() {
    let store = InMemoryStore::new();
    let episodes: Arc<dyn EpisodeStore> = Arc::new(store.clone());

    let first = (1..=12)
        .map(|o| EpisodeOperation::Upsert(episode(o, "old")))
        .collect();
    episodes.transaction("proj", first).await.unwrap();

    let mut second: Vec<EpisodeOperation> = (1..=8)
        .map(|o| EpisodeOperation::Upsert(episode(o, "new")))
        .collect();
    second.push(EpisodeOperation::DeleteAfterOrder(8));
    second.push(EpisodeOperation::SetWorkflowState(
        "EPISODE_PLAN_EDITING".to_string(),
    ));
    let results = episodes.transaction("proj", second).await.unwrap();

    assert_eq!(results[0], OperationResult::Upserted { order: 1 });
    assert_eq!(results[8], OperationResult::Deleted { count: 4 });
    assert_eq!(results[9], OperationResult::WorkflowStateSet);

    let listed = episodes.list_episodes("proj").await.unwrap();
    assert_eq!(listed.len(), 8);
    assert!(listed.iter().all(|e| e.title == "new"));
    assert_eq!(
        store.workflow_state("proj").await.as_deref(),
        Some("EPISODE_PLAN_EDITING")
    );
}

#[tokio::test]
async fn test_projects_are_isolated() {
    let store = InMemoryStore::new();
    store
        .transaction("a", vec![EpisodeOperation::Upsert(episode(1, "a1"))])
        .await
        .unwrap();
    store
        .transaction("b", vec![EpisodeOperation::DeleteAfterOrder(0)])
        .await
        .unwrap();

    assert_eq!(store.list_episodes("a").await.unwrap().len(), 1);
    assert!(store.list_episodes("b").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_artifact_save_replaces_previous_value() {
    let store = InMemoryStore::new();
    for version in 1..=2 {
        store
            .save_artifact(ArtifactWrite {
                kind: ArtifactKind::SoundDesign,
                owner_id: "scene-1".to_string(),
                value: json!({ "version": version }),
            })
            .await
            .unwrap();
    }

    assert_eq!(
        store.artifact(ArtifactKind::SoundDesign, "scene-1").await,
        Some(json!({ "version": 2 }))
    );
    assert_eq!(store.artifact(ArtifactKind::SceneScript, "scene-1").await, None);
}
