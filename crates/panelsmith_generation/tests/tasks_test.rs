//! Generation tasks and the episode creation agent.

use panelsmith_agent::{ExecutionMode, StepKind};
use panelsmith_cache::MapPromptSource;
use panelsmith_config::PanelsmithConfig;
use panelsmith_core::TokenUsage;
use panelsmith_database::InMemoryStore;
use panelsmith_error::{PanelsmithErrorKind, UpstreamErrorKind};
use panelsmith_generation::{EPISODE_CREATION_FALLBACK_REASON, Generator, SceneBrief};
use panelsmith_interface::testing::ScriptedDriver;
use panelsmith_interface::{ArtifactKind, EpisodeOperation, EpisodeRecord, EpisodeStore};
use serde_json::json;
use std::sync::Arc;

fn config() -> PanelsmithConfig {
    PanelsmithConfig::defaults().unwrap()
}

fn brief() -> SceneBrief {
    SceneBrief::builder()
        .scene_id("scene-1")
        .summary("Aoi sprints across wet rooftops")
        .characters(vec!["Aoi".to_string()])
        .mood("urgent")
        .build()
        .unwrap()
}

async fn seed_episode(store: &InMemoryStore, order: u32) {
    store
        .transaction(
            "p1",
            vec![EpisodeOperation::Upsert(EpisodeRecord {
                order,
                title: format!("Episode {}", order),
                summary: "The courier takes the job".to_string(),
                outline: json!({ "beats": ["pickup", "ambush"] }),
            })],
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_sound_design_is_saved() {
    let driver = Arc::new(ScriptedDriver::new().reply(
        "Here is the design:\n{\"cues\": [{\"id\": \"c1\", \"type\": \"ambience\", \"description\": \"Heavy rain\", \"volume\": 0.6}], \"masterMood\": \"tense\"}",
        Some(TokenUsage::new(40, 60, 100)),
    ));
    let store = Arc::new(InMemoryStore::new());
    let generator = Generator::new(driver.clone(), store.clone(), store.clone(), &config());

    let output = generator.generate_sound_design(&brief()).await.unwrap();

    assert_eq!(output.cue_count, 1);
    assert!(!output.fixed);
    assert!(output.extracted_json.starts_with("{\"cues\""));
    assert_eq!(output.token_usage.map(|u| u.total), Some(100));

    let saved = store
        .artifact(ArtifactKind::SoundDesign, "scene-1")
        .await
        .unwrap();
    assert_eq!(saved["masterMood"], "tense");
    assert_eq!(saved["cues"][0]["type"], "ambience");

    let serialized = serde_json::to_value(&output).unwrap();
    assert_eq!(serialized["sceneId"], "scene-1");
    assert_eq!(serialized["tokenUsage"]["total"], 100);
}

#[tokio::test]
async fn test_empty_cues_are_fixed_once() {
    let driver = Arc::new(
        ScriptedDriver::new()
            .reply("{\"cues\": []}", Some(TokenUsage::new(10, 5, 15)))
            .reply(
                "{\"cues\": [{\"id\": \"c1\", \"type\": \"sfx\", \"description\": \"Glass breaks\"}]}",
                Some(TokenUsage::new(30, 10, 40)),
            ),
    );
    let store = Arc::new(InMemoryStore::new());
    let generator = Generator::new(driver.clone(), store.clone(), store.clone(), &config());

    let output = generator.generate_sound_design(&brief()).await.unwrap();

    assert!(output.fixed);
    assert_eq!(driver.call_count(), 2);
    assert_eq!(output.token_usage, Some(TokenUsage::new(40, 15, 55)));

    let fix = &driver.requests()[1];
    assert!(fix.messages[1].content.contains("cues: must not be empty"));
    assert!(fix.messages[1].content.contains("<<<\n{\"cues\": []}\n>>>"));
}

#[tokio::test]
async fn test_upstream_timeout_is_not_retried() {
    let driver = Arc::new(
        ScriptedDriver::new()
            .fail(UpstreamErrorKind::Timeout { timeout_ms: 120_000 })
            .reply(
                "{\"cues\": [{\"id\": \"c1\", \"type\": \"sfx\", \"description\": \"Door slams\"}]}",
                None,
            ),
    );
    let store = Arc::new(InMemoryStore::new());
    let generator = Generator::new(driver.clone(), store.clone(), store.clone(), &config());

    let err = generator.generate_sound_design(&brief()).await.unwrap_err();

    assert!(err.is_upstream());
    assert!(!err.is_fixable());
    assert_eq!(driver.call_count(), 1);
    assert!(store.artifact(ArtifactKind::SoundDesign, "scene-1").await.is_none());
}

#[tokio::test]
async fn test_timeout_on_fix_call_propagates() {
    let driver = Arc::new(
        ScriptedDriver::new()
            .reply("{\"cues\": []}", None)
            .fail(UpstreamErrorKind::Timeout { timeout_ms: 120_000 }),
    );
    let store = Arc::new(InMemoryStore::new());
    let generator = Generator::new(driver.clone(), store.clone(), store.clone(), &config());

    let err = generator.generate_sound_design(&brief()).await.unwrap_err();

    assert!(err.is_upstream());
    assert_eq!(driver.call_count(), 2);
}

#[tokio::test]
async fn test_upstream_http_error_is_not_retried() {
    let driver = Arc::new(
        ScriptedDriver::new()
            .fail(UpstreamErrorKind::Http {
                status: 429,
                detail: "rate limited".to_string(),
            })
            .reply(
                "{\"sceneHeading\": \"INT. LOFT - DAY\", \"actionLines\": [], \"dialogueBlocks\": [], \"soundCues\": []}",
                None,
            ),
    );
    let store = Arc::new(InMemoryStore::new());
    let generator = Generator::new(driver.clone(), store.clone(), store.clone(), &config());

    let err = generator.generate_scene_script(&brief()).await.unwrap_err();

    assert!(err.is_upstream());
    assert!(err.to_string().contains("(429) - rate limited"));
    assert_eq!(driver.call_count(), 1);
}

#[tokio::test]
async fn test_token_usage_is_null_without_reports() {
    let driver = Arc::new(ScriptedDriver::new().reply(
        "{\"sceneHeading\": \"EXT. ROOFTOP - NIGHT\", \"actionLines\": [\"Rain.\"], \"dialogueBlocks\": [{\"character\": \"Aoi\", \"line\": \"Not tonight.\"}], \"soundCues\": []}",
        None,
    ));
    let store = Arc::new(InMemoryStore::new());
    let generator = Generator::new(driver.clone(), store.clone(), store.clone(), &config());

    let output = generator.generate_scene_script(&brief()).await.unwrap();

    let serialized = serde_json::to_value(&output).unwrap();
    assert!(serialized["tokenUsage"].is_null());
    assert_eq!(output.scene_script.dialogue_blocks.len(), 1);
    assert!(store.artifact(ArtifactKind::SceneScript, "scene-1").await.is_some());
}

#[tokio::test]
async fn test_scene_list_expects_an_array() {
    let driver = Arc::new(ScriptedDriver::new().reply(
        "Scenes:\n[{\"order\": 1, \"summary\": \"Pickup at the docks\"}, {\"order\": 2, \"summary\": \"Ambush in the alley\"}]",
        None,
    ));
    let store = Arc::new(InMemoryStore::new());
    seed_episode(&store, 1).await;
    let generator = Generator::new(driver.clone(), store.clone(), store.clone(), &config());

    let output = generator.generate_scene_list("p1", 1).await.unwrap();

    assert_eq!(output.scene_count, 2);
    assert_eq!(output.scenes[1].summary, "Ambush in the alley");
    let saved = store
        .artifact(ArtifactKind::SceneList, "p1:episode:1")
        .await
        .unwrap();
    assert!(saved.is_array());
}

#[tokio::test]
async fn test_emotion_arc_without_episodes_is_not_found() {
    let driver = Arc::new(ScriptedDriver::new());
    let store = Arc::new(InMemoryStore::new());
    let generator = Generator::new(driver.clone(), store.clone(), store.clone(), &config());

    let err = generator.generate_emotion_arc("p1").await.unwrap_err();

    assert!(matches!(err.kind(), PanelsmithErrorKind::Storage(_)));
    assert_eq!(driver.call_count(), 0);
}

#[tokio::test]
async fn test_prompt_override_reaches_the_model() {
    let driver = Arc::new(ScriptedDriver::new().reply(
        "{\"points\": [{\"episodeOrder\": 1, \"tension\": 4, \"emotionalValence\": -1}]}",
        None,
    ));
    let store = Arc::new(InMemoryStore::new());
    seed_episode(&store, 1).await;
    let source = MapPromptSource::new().with_prompt("workflow.emotion_arc.system", "Custom analyst");
    let generator = Generator::new(driver.clone(), store.clone(), store.clone(), &config())
        .with_prompt_source(Arc::new(source), 300);

    let output = generator.generate_emotion_arc("p1").await.unwrap();

    assert_eq!(output.point_count, 1);
    assert_eq!(driver.requests()[0].messages[0].content, "Custom analyst");
}

#[tokio::test]
async fn test_disabled_episode_agent_uses_legacy_without_trace() {
    let driver = Arc::new(ScriptedDriver::new());
    let store = Arc::new(InMemoryStore::new());
    let mut config = config();
    config.agent.episode_creation_enabled = false;
    let generator = Generator::new(driver.clone(), store.clone(), store.clone(), &config);

    let outcome = generator.run_episode_creation_agent("p1", 1).await.unwrap();

    assert_eq!(outcome.execution_mode, ExecutionMode::Legacy);
    assert!(!outcome.fallback_used);
    assert!(outcome.agent_trace.is_none());
    assert_eq!(driver.call_count(), 0);
}

#[tokio::test]
async fn test_episode_agent_reads_context_then_proceeds() {
    let driver = Arc::new(
        ScriptedDriver::new()
            .reply(
                r#"{"kind":"tool_call","toolName":"read_episode_context","toolInput":{}}"#,
                Some(TokenUsage::new(50, 10, 60)),
            )
            .reply(
                r#"{"kind":"final","final":{"proceed":true}}"#,
                Some(TokenUsage::new(70, 5, 75)),
            ),
    );
    let store = Arc::new(InMemoryStore::new());
    seed_episode(&store, 2).await;
    let generator = Generator::new(driver.clone(), store.clone(), store.clone(), &config());

    let outcome = generator.run_episode_creation_agent("p1", 2).await.unwrap();

    assert_eq!(outcome.execution_mode, ExecutionMode::Agent);
    assert!(!outcome.fallback_used);
    assert_eq!(outcome.token_usage.map(|u| u.total), Some(135));
    let summaries: Vec<&str> = outcome.agent_steps.iter().map(|s| s.summary.as_str()).collect();
    assert_eq!(summaries, vec!["tool_call:read_episode_context", "final"]);

    let feedback: serde_json::Value =
        serde_json::from_str(&driver.requests()[1].messages[3].content).unwrap();
    assert_eq!(feedback["toolResult"]["output"]["found"], true);
    assert_eq!(feedback["toolResult"]["output"]["title"], "Episode 2");
    assert!(driver.requests()[0].messages[0].content.contains("read_episode_context"));
}

#[tokio::test]
async fn test_episode_agent_refusal_falls_back_to_legacy() {
    let driver = Arc::new(
        ScriptedDriver::new().reply(r#"{"kind":"final","final":{"proceed":false}}"#, None),
    );
    let store = Arc::new(InMemoryStore::new());
    let generator = Generator::new(driver.clone(), store.clone(), store.clone(), &config());

    let outcome = generator.run_episode_creation_agent("p1", 1).await.unwrap();

    assert_eq!(outcome.execution_mode, ExecutionMode::Legacy);
    assert!(outcome.fallback_used);
    let trace = outcome.agent_trace.unwrap();
    assert_eq!(
        trace.fallback_reason.as_deref(),
        Some(EPISODE_CREATION_FALLBACK_REASON)
    );
    assert_eq!(trace.steps_of(StepKind::Fallback).count(), 1);
}
