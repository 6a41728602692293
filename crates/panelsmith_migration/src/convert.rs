//! Legacy keyframe prompt to 3x3 storyboard conversion.
//!
//! Legacy prompts carry one block per keyframe (`KF0` to `KF8`), each with a
//! `zh` and/or `en` locale. Keyframe `n` becomes panel `n` of the grid.

use crate::shot::{SHOT_ORDER, focus_for_index};
use crate::storyboard::{
    StoryboardConfig, StoryboardPromptV2, StoryboardShot, TechnicalRequirements, VisualAnchor,
    is_storyboard_prompt_v2,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

const EMPTY_BLOCK_DESCRIPTION: &str = "画面内容保持连贯，光影与氛围一致。";
const LIGHTING_CLOSING: &str = "光影与氛围保持一致。";
const DEFAULT_CHARACTER_ANCHOR: &str = "主角外观与服装保持一致";
const DEFAULT_ENVIRONMENT_ANCHOR: &str = "环境与空间关系保持一致";
const LIGHTING_ANCHOR: &str = "统一主光方向与色温，不跨镜头跳变";
const MOOD_ANCHOR: &str = "紧张";
const CONSISTENCY_RULE: &str =
    "ABSOLUTE: Same character face, same costume, same lighting across all 9 panels";
const COMPOSITION_RULE: &str = "Label '分镜X' top-left corner, no timecode, cinematic 2.39:1 ratio";
const QUALITY_RULE: &str = "Photorealistic, 8K, film grain";

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LegacySubject {
    name: Option<String>,
    position: Option<String>,
    pose: Option<String>,
    action: Option<String>,
    expression: Option<String>,
    gaze: Option<String>,
    interaction: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LegacyBlock {
    subjects: Vec<LegacySubject>,
    used_anchors: Vec<String>,
    composition: Option<String>,
}

fn join_present<'a>(parts: impl IntoIterator<Item = Option<&'a str>>, separator: &str) -> String {
    parts
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

fn non_empty_str<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// The `zh` block of a keyframe, else its `en` block.
fn locale_block(frame: Option<&Value>) -> Option<LegacyBlock> {
    let frame = frame?;
    ["zh", "en"]
        .iter()
        .filter_map(|locale| frame.get(*locale))
        .find(|block| block.is_object())
        .map(|block| LegacyBlock::deserialize(block).unwrap_or_default())
}

fn describe(block: Option<&LegacyBlock>) -> String {
    let Some(block) = block else {
        return EMPTY_BLOCK_DESCRIPTION.to_string();
    };

    let subjects = block
        .subjects
        .iter()
        .map(|s| {
            join_present(
                [
                    s.name.as_deref(),
                    s.position.as_deref(),
                    s.pose.as_deref(),
                    s.action.as_deref(),
                    s.expression.as_deref(),
                    s.gaze.as_deref(),
                    s.interaction.as_deref(),
                ],
                "，",
            )
        })
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("；");
    let anchors = if block.used_anchors.is_empty() {
        String::new()
    } else {
        format!("锚点：{}", block.used_anchors.join("、"))
    };
    let composition = match block.composition.as_deref() {
        Some(c) if !c.is_empty() => format!("构图：{}", c),
        _ => String::new(),
    };

    join_present(
        [
            Some(subjects.as_str()),
            Some(anchors.as_str()),
            Some(composition.as_str()),
            Some(LIGHTING_CLOSING),
        ],
        " ",
    )
}

fn visual_anchor(first: Option<&LegacyBlock>) -> VisualAnchor {
    let character = first
        .map(|block| {
            block
                .subjects
                .iter()
                .map(|s| join_present([s.name.as_deref(), s.pose.as_deref()], ":"))
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join("；")
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_CHARACTER_ANCHOR.to_string());
    let environment = match first {
        Some(block) if !block.used_anchors.is_empty() => {
            format!("场景锚点：{}", block.used_anchors.join("、"))
        }
        _ => DEFAULT_ENVIRONMENT_ANCHOR.to_string(),
    };

    VisualAnchor {
        character: Some(character),
        environment: Some(environment),
        lighting: Some(LIGHTING_ANCHOR.to_string()),
        mood: Some(MOOD_ANCHOR.to_string()),
        extra: Map::new(),
    }
}

/// Convert a stored legacy shot prompt to the grid format.
///
/// Returns `None` when the text is not JSON, has no `keyframes` object, or is
/// an already-migrated prompt that does not fit the typed grid shape.
/// Already-migrated prompts are returned unchanged, so conversion is
/// idempotent.
///
/// # Examples
///
/// ```
/// use panelsmith_migration::{convert_legacy_shot_prompt_to_v2, SHOT_ORDER};
///
/// let legacy = r#"{"keyframes": {"KF0": {"zh": {"subjects": [{"name": "主角", "pose": "站立"}]}}}}"#;
/// let grid = convert_legacy_shot_prompt_to_v2(legacy).unwrap();
/// assert_eq!(grid.shots.len(), 9);
/// assert_eq!(grid.shots[0].shot_type, SHOT_ORDER[0]);
///
/// assert!(convert_legacy_shot_prompt_to_v2("not json").is_none());
/// ```
pub fn convert_legacy_shot_prompt_to_v2(text: &str) -> Option<StoryboardPromptV2> {
    let parsed: Value = serde_json::from_str(text).ok()?;

    if is_storyboard_prompt_v2(&parsed) {
        return StoryboardPromptV2::deserialize(&parsed)
            .inspect_err(|e| debug!(error = %e, "Grid prompt does not fit the typed shape"))
            .ok();
    }

    let keyframes = parsed.get("keyframes").and_then(Value::as_object)?;
    let angle = non_empty_str(&parsed, "/camera/angle");

    let shots = SHOT_ORDER
        .iter()
        .enumerate()
        .map(|(index, shot_type)| {
            let block = locale_block(keyframes.get(&format!("KF{}", index)));
            StoryboardShot {
                shot_number: Some(format!("分镜{}", index + 1)),
                shot_type: *shot_type,
                type_cn: Some(shot_type.label_cn().to_string()),
                description: describe(block.as_ref()),
                angle: Some(angle.unwrap_or(shot_type.default_angle()).to_string()),
                focus: Some(focus_for_index(index).to_string()),
                extra: Map::new(),
            }
        })
        .collect();

    let first = locale_block(keyframes.get("KF0"));
    let quality = match non_empty_str(&parsed, "/avoid/zh") {
        Some(avoid) => format!("{}, avoid={}", QUALITY_RULE, avoid),
        None => QUALITY_RULE.to_string(),
    };

    Some(StoryboardPromptV2 {
        storyboard_config: StoryboardConfig {
            layout: Some("3x3_grid".to_string()),
            aspect_ratio: Some("16:9".to_string()),
            style: Some("modern_thriller".to_string()),
            visual_anchor: Some(visual_anchor(first.as_ref())),
            extra: Map::new(),
        },
        shots,
        technical_requirements: TechnicalRequirements {
            consistency: Some(CONSISTENCY_RULE.to_string()),
            composition: Some(COMPOSITION_RULE.to_string()),
            quality: Some(quality),
            extra: Map::new(),
        },
        extra: Map::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn legacy() -> Value {
        let keyframes: Map<String, Value> = (0..9)
            .map(|i| {
                (
                    format!("KF{}", i),
                    json!({
                        "zh": {
                            "subjects": [{ "name": "主角", "position": format!("位置{}", i + 1), "action": format!("动作{}", i + 1) }],
                            "usedAnchors": ["站台灯箱", "轨道线"],
                            "composition": format!("构图{}", i + 1),
                            "bubbleSpace": "右上"
                        }
                    }),
                )
            })
            .collect();
        json!({
            "camera": { "type": "MS", "angle": "eye_level", "aspectRatio": "16:9" },
            "keyframes": keyframes,
            "avoid": { "zh": "不要水印", "en": "no watermark" }
        })
    }

    #[test]
    fn test_legacy_keyframes_become_grid() {
        let grid = convert_legacy_shot_prompt_to_v2(&legacy().to_string()).unwrap();
        let value = serde_json::to_value(&grid).unwrap();

        assert!(is_storyboard_prompt_v2(&value));
        assert_eq!(grid.shots[0].shot_number.as_deref(), Some("分镜1"));
        assert_eq!(
            grid.shots[0].description,
            "主角，位置1，动作1 锚点：站台灯箱、轨道线 构图：构图1 光影与氛围保持一致。"
        );
        assert_eq!(grid.shots[8].angle.as_deref(), Some("eye_level"));
        assert_eq!(grid.shots[4].focus.as_deref(), Some("人物情绪"));
        assert_eq!(
            grid.technical_requirements.quality.as_deref(),
            Some("Photorealistic, 8K, film grain, avoid=不要水印")
        );
        let anchor = grid.storyboard_config.visual_anchor.unwrap();
        assert_eq!(anchor.character.as_deref(), Some("主角"));
        assert_eq!(anchor.environment.as_deref(), Some("场景锚点：站台灯箱、轨道线"));
    }

    #[test]
    fn test_missing_blocks_use_defaults() {
        let text = json!({ "keyframes": { "KF3": { "en": { "composition": "wide" } } } }).to_string();
        let grid = convert_legacy_shot_prompt_to_v2(&text).unwrap();

        assert_eq!(grid.shots[0].description, EMPTY_BLOCK_DESCRIPTION);
        assert_eq!(grid.shots[3].description, "构图：wide 光影与氛围保持一致。");
        assert_eq!(grid.shots[7].angle.as_deref(), Some("Extreme low angle"));
        assert_eq!(grid.shots[8].type_cn.as_deref(), Some("俯拍"));
        let anchor = grid.storyboard_config.visual_anchor.unwrap();
        assert_eq!(anchor.character.as_deref(), Some(DEFAULT_CHARACTER_ANCHOR));
        assert_eq!(anchor.environment.as_deref(), Some(DEFAULT_ENVIRONMENT_ANCHOR));
        assert_eq!(grid.technical_requirements.quality.as_deref(), Some(QUALITY_RULE));
    }

    #[test]
    fn test_unconvertible_inputs() {
        assert!(convert_legacy_shot_prompt_to_v2("").is_none());
        assert!(convert_legacy_shot_prompt_to_v2("{oops").is_none());
        assert!(convert_legacy_shot_prompt_to_v2("{\"camera\": {}}").is_none());
        assert!(convert_legacy_shot_prompt_to_v2("[1, 2]").is_none());
    }

    #[test]
    fn test_conversion_is_idempotent() {
        let first = convert_legacy_shot_prompt_to_v2(&legacy().to_string()).unwrap();
        let text = serde_json::to_string_pretty(&first).unwrap();
        let second = convert_legacy_shot_prompt_to_v2(&text).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_grid_input_is_returned_unchanged() {
        let shots: Vec<Value> = SHOT_ORDER
            .iter()
            .enumerate()
            .map(|(i, t)| {
                json!({
                    "shot_number": format!("分镜{}", i + 1),
                    "type": t.to_string(),
                    "type_cn": "x",
                    "description": format!("描述{}", i + 1),
                    "angle": "Eye level",
                    "focus": "叙事",
                    "seed": i
                })
            })
            .collect();
        let grid = json!({
            "storyboard_config": {
                "layout": "3x3_grid",
                "visual_anchor": { "character": "角色锚点", "props": ["伞"] },
                "palette": "teal"
            },
            "shots": shots,
            "technical_requirements": { "quality": "8K" },
            "revision": 3
        });

        let out = convert_legacy_shot_prompt_to_v2(&grid.to_string()).unwrap();
        assert_eq!(serde_json::to_value(&out).unwrap(), grid);
    }
}
