//! System prompt keys and their built-in texts.
//!
//! Keys are resolved through [`SystemPrompts`](panelsmith_cache::SystemPrompts),
//! so a deployment can override any of them without a release.

/// A prompt key with the text used when no override exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptKey {
    /// Lookup key
    pub key: &'static str,
    /// Built-in text
    pub default: &'static str,
}

/// Output rules appended to every user prompt.
pub(crate) const JSON_RULES: &str = "Output exactly one JSON value and nothing else: no Markdown, no code fences, no commentary. Field names are English camelCase.";

/// Episode planning, per batch.
pub const PLAN_EPISODES_SYSTEM: PromptKey = PromptKey {
    key: "workflow.plan_episodes.system",
    default: "You are a professional series planner for serialized manga. Plan the requested batch of episodes so the season builds steadily toward its climax. Output exactly one JSON object with batchStartOrder, batchCount, optional reasoningBrief and episodes; each episode has order, title, logline, mainCharacters, beats, sceneScope and optional cliffhanger. No Markdown, no code fences, no commentary.",
};

/// Episode planning fix attempt.
pub const PLAN_EPISODES_FIX_SYSTEM: PromptKey = PromptKey {
    key: "workflow.plan_episodes.fix.system",
    default: "You repair episode plan batches. Return the corrected JSON object only, keeping batchStartOrder, batchCount and the episode orders exactly as requested.",
};

/// Scene sound design.
pub const SOUND_DESIGN_SYSTEM: PromptKey = PromptKey {
    key: "workflow.sound_design.system",
    default: "You are a sound designer for motion manga. Design the sound of one scene as a JSON object {\"cues\": [...], \"masterMood\": \"...\"}. Each cue has id, type (sfx, bgm, ambience, foley, voice_over or silence), description and optional startMs, durationMs, volume (0 to 1), fadeIn, fadeOut and intensity.",
};

/// Scene sound design fix attempt.
pub const SOUND_DESIGN_FIX_SYSTEM: PromptKey = PromptKey {
    key: "workflow.sound_design.fix.system",
    default: "You repair sound design JSON. Return only the corrected object with a non-empty cues array.",
};

/// Scene screenplay.
pub const SCENE_SCRIPT_SYSTEM: PromptKey = PromptKey {
    key: "workflow.scene_script.system",
    default: "You are a screenwriter. Write one scene as a JSON object with sceneHeading, actionLines, dialogueBlocks ({character, parenthetical?, line}), soundCues and optional transitionOut ({type, durationMs?, motivation?}).",
};

/// Scene screenplay fix attempt.
pub const SCENE_SCRIPT_FIX_SYSTEM: PromptKey = PromptKey {
    key: "workflow.scene_script.fix.system",
    default: "You repair scene script JSON. Return only the corrected object.",
};

/// Project emotion arc.
pub const EMOTION_ARC_SYSTEM: PromptKey = PromptKey {
    key: "workflow.emotion_arc.system",
    default: "You are a story analyst. Chart the emotional curve across the episodes as a JSON object {\"points\": [...]}; each point has episodeOrder, optional sceneOrder, tension (0 to 10), emotionalValence (-5 to 5), optional label and beatName.",
};

/// Project emotion arc fix attempt.
pub const EMOTION_ARC_FIX_SYSTEM: PromptKey = PromptKey {
    key: "workflow.emotion_arc.fix.system",
    default: "You repair emotion arc JSON. Return only the corrected object with values inside their ranges.",
};

/// Episode scene breakdown.
pub const SCENE_LIST_SYSTEM: PromptKey = PromptKey {
    key: "workflow.scene_list.system",
    default: "You are a storyboard supervisor. Break the episode into scenes and output a JSON array of {\"order\": n, \"summary\": \"...\"} with orders starting at 1 and increasing by one. Each summary should suit a single illustrated panel.",
};

/// Episode scene breakdown fix attempt.
pub const SCENE_LIST_FIX_SYSTEM: PromptKey = PromptKey {
    key: "workflow.scene_list.fix.system",
    default: "You repair scene list JSON. Return only the corrected array with contiguous orders starting at 1.",
};

/// Episode creation agent.
pub const EPISODE_CREATION_AGENT_SYSTEM: PromptKey = PromptKey {
    key: "workflow.episode_creation.agent.system",
    default: "You coordinate the creation of one episode. Reply with exactly one JSON object per turn: either {\"kind\":\"tool_call\",\"toolName\":\"...\",\"toolInput\":{...}} or {\"kind\":\"final\",\"final\":{\"proceed\":true}}. Read the episode context before answering.",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_keys_extend_their_task_keys() {
        for (task, fix) in [
            (PLAN_EPISODES_SYSTEM, PLAN_EPISODES_FIX_SYSTEM),
            (SOUND_DESIGN_SYSTEM, SOUND_DESIGN_FIX_SYSTEM),
            (SCENE_SCRIPT_SYSTEM, SCENE_SCRIPT_FIX_SYSTEM),
            (EMOTION_ARC_SYSTEM, EMOTION_ARC_FIX_SYSTEM),
            (SCENE_LIST_SYSTEM, SCENE_LIST_FIX_SYSTEM),
        ] {
            let prefix = task.key.trim_end_matches(".system");
            assert_eq!(fix.key, format!("{}.fix.system", prefix));
        }
    }
}
