//! Chunked episode planning.
//!
//! Large plans are requested in fixed-size batches. Each batch runs through
//! the single-retry protocol with a contract that pins its order range, and
//! the accumulated plan is persisted in one transaction at the end.

use crate::artifacts::{ArtifactRules, EpisodePlanBatch, EpisodePlanEntry};
use crate::contract::deserialize_candidate;
use crate::generator::Generator;
use crate::prompts::{self, JSON_RULES};
use derive_builder::Builder;
use panelsmith_core::{JsonKind, TokenUsage};
use panelsmith_error::{JsonError, PanelsmithResult, ValidationError};
use panelsmith_interface::{Contract, EpisodeOperation, EpisodeRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, info, instrument};

/// Workflow state a project enters once its episodes are planned.
pub const EPISODE_PLAN_EDITING: &str = "EPISODE_PLAN_EDITING";

const TOKENS_PER_EPISODE: u32 = 320;
const MIN_BATCH_TOKENS: u32 = 1800;
const MAX_BATCH_TOKENS: u32 = 20000;

/// One bounded sub-request of an ordered plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchChunk<T> {
    /// Order of the first item
    pub batch_start_order: u32,
    /// Number of items
    pub batch_count: u32,
    /// Items, ordered
    pub items: Vec<T>,
}

impl<T> BatchChunk<T> {
    /// Last order covered by the chunk.
    ///
    /// An empty chunk ends just before its start. Saturates at the bounds of `u32`.
    pub fn end_order(&self) -> u32 {
        match self.batch_count.checked_sub(1) {
            Some(last) => self.batch_start_order.saturating_add(last),
            None => self.batch_start_order.saturating_sub(1),
        }
    }
}

/// Split `1..=target` into consecutive `(start, count)` ranges of at most `size`.
///
/// # Examples
///
/// ```
/// use panelsmith_generation::batch_ranges;
///
/// assert_eq!(batch_ranges(23, 10), vec![(1, 10), (11, 10), (21, 3)]);
/// assert!(batch_ranges(0, 10).is_empty());
/// ```
pub fn batch_ranges(target: u32, size: u32) -> Vec<(u32, u32)> {
    let size = size.max(1);
    let mut ranges = Vec::new();
    let mut start = 1;
    while start <= target {
        let count = size.min(target - start + 1);
        ranges.push((start, count));
        let Some(next) = start.checked_add(count) else {
            break;
        };
        start = next;
    }
    ranges
}

/// Inputs of [`Generator::plan_episodes`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[builder(setter(into))]
#[serde(rename_all = "camelCase")]
pub struct PlanEpisodesInput {
    /// Project to plan
    pub project_id: String,
    /// Story synopsis
    pub synopsis: String,
    /// Full art style prompt
    #[builder(default)]
    #[serde(default)]
    pub style: String,
    /// Character roster, one description per character
    #[builder(default)]
    #[serde(default)]
    pub characters: Vec<String>,
    /// World-building notes
    #[builder(default, setter(strip_option))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world_view: Option<String>,
    /// Episodes to plan; the configured default when absent
    #[builder(default, setter(strip_option))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_episode_count: Option<u32>,
}

impl PlanEpisodesInput {
    /// Create a builder.
    pub fn builder() -> PlanEpisodesInputBuilder {
        PlanEpisodesInputBuilder::default()
    }
}

/// How one batch went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    /// Order of the first episode
    pub batch_start_order: u32,
    /// Episodes in the batch
    pub batch_count: u32,
    /// Whether the fix attempt was needed
    pub fixed: bool,
    /// Usage of the batch
    pub token_usage: Option<TokenUsage>,
}

/// Result of [`Generator::plan_episodes`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodePlanOutput {
    /// Episodes planned, equal to the target
    pub episode_count: u32,
    /// The whole plan ordered from 1
    pub episodes: Vec<EpisodePlanEntry>,
    /// Rationale from the first batch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_brief: Option<String>,
    /// One entry per batch
    pub batches: Vec<BatchReport>,
    /// Whether any batch needed its fix attempt
    pub fixed: bool,
    /// Usage across every batch
    pub token_usage: Option<TokenUsage>,
}

/// Contract for one batch: the shape rules plus the requested order range.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EpisodeBatchContract {
    start: u32,
    count: u32,
}

impl EpisodeBatchContract {
    pub(crate) fn new(start: u32, count: u32) -> Self {
        Self { start, count }
    }

    fn end(&self) -> u32 {
        self.start + self.count - 1
    }
}

impl Contract for EpisodeBatchContract {
    type Output = EpisodePlanBatch;

    fn name(&self) -> &str {
        "episode_plan_batch"
    }

    fn expected_kind(&self) -> JsonKind {
        JsonKind::Object
    }

    fn validate(&self, candidate: &Value) -> Result<EpisodePlanBatch, Vec<String>> {
        let batch: EpisodePlanBatch = deserialize_candidate(candidate)?;
        let mut issues = batch.check();

        if batch.batch_start_order != self.start {
            issues.push(format!(
                "batchStartOrder: expected {}, got {}",
                self.start, batch.batch_start_order
            ));
        }
        if batch.batch_count != self.count {
            issues.push(format!(
                "batchCount: expected {}, got {}",
                self.count, batch.batch_count
            ));
        }
        if batch.episodes.len() != self.count as usize {
            issues.push(format!(
                "episodes: expected {} entries, got {}",
                self.count,
                batch.episodes.len()
            ));
        }
        let orders: BTreeSet<u32> = batch.episodes.iter().map(|e| e.order).collect();
        let expected: BTreeSet<u32> = (self.start..=self.end()).collect();
        if orders != expected || orders.len() != batch.episodes.len() {
            issues.push(format!(
                "episodes[].order: must be exactly {} to {} without duplicates",
                self.start,
                self.end()
            ));
        }

        if issues.is_empty() {
            Ok(batch)
        } else {
            Err(issues)
        }
    }

    fn fix_hint(&self) -> Option<String> {
        Some(format!(
            "batchStartOrder must be {}, batchCount must be {} and episodes must have orders {} to {}",
            self.start,
            self.count,
            self.start,
            self.end()
        ))
    }
}

fn batch_max_tokens(count: u32) -> u32 {
    count
        .saturating_mul(TOKENS_PER_EPISODE)
        .clamp(MIN_BATCH_TOKENS, MAX_BATCH_TOKENS)
}

fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return "-".to_string();
    }
    items
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

fn planned_digest(planned: &[EpisodePlanEntry]) -> String {
    planned
        .iter()
        .map(|e| {
            let mut line = format!("- ({}) {}: {}", e.order, e.title, e.logline);
            if let Some(cliffhanger) = &e.cliffhanger {
                line.push_str(&format!(" [hook: {}]", cliffhanger));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn batch_prompt(
    input: &PlanEpisodesInput,
    target: u32,
    start: u32,
    count: u32,
    planned: &[EpisodePlanEntry],
) -> String {
    let end = start + count - 1;
    let mut sections = vec![
        format!(
            "Plan episodes {} to {} of a {}-episode season.",
            start, end, target
        ),
        format!("Synopsis:\n{}", input.synopsis),
        format!(
            "Art style:\n{}",
            if input.style.is_empty() { "-" } else { input.style.as_str() }
        ),
        format!(
            "World view:\n{}",
            input.world_view.as_deref().unwrap_or("-")
        ),
        format!("Characters:\n{}", bullet_list(&input.characters)),
    ];
    if !planned.is_empty() {
        sections.push(format!(
            "Episodes already planned (stay consistent, do not repeat them):\n{}",
            planned_digest(planned)
        ));
    }

    let mut rules = vec![
        format!("- batchStartOrder must be {}", start),
        format!("- batchCount must be {}", count),
        format!("- episodes must contain exactly orders {} to {}", start, end),
        "- every episode needs order, title, logline, mainCharacters, beats and sceneScope".to_string(),
        "- pick mainCharacters from the roster; use an empty array when it is empty".to_string(),
    ];
    if planned.is_empty() {
        rules.push("- include reasoningBrief: one paragraph on why the season has this shape".to_string());
    } else {
        rules.push("- omit reasoningBrief".to_string());
    }
    sections.push(format!("Constraints:\n{}", rules.join("\n")));
    sections.push(JSON_RULES.to_string());
    sections.join("\n\n")
}

impl Generator {
    /// Plan a season of episodes in batches and persist it atomically.
    ///
    /// Batches are requested one after another, each seeing a digest of the
    /// episodes planned so far. Nothing is written unless every batch succeeds.
    ///
    /// # Errors
    ///
    /// - Validation error when the target is outside `1..=max_episode_count`.
    /// - The terminal error of the first batch that fails both attempts.
    /// - Upstream and storage errors.
    #[instrument(skip(self, input), fields(project_id = %input.project_id))]
    pub async fn plan_episodes(&self, input: &PlanEpisodesInput) -> PanelsmithResult<EpisodePlanOutput> {
        let settings = self.generation_settings();
        let target = input
            .target_episode_count
            .unwrap_or(settings.default_episode_count);
        if target == 0 || target > settings.max_episode_count {
            return Err(ValidationError::new(
                "plan_episodes_input",
                vec![format!(
                    "targetEpisodeCount: must be between 1 and {}, got {}",
                    settings.max_episode_count, target
                )],
            )
            .into());
        }

        let ranges = batch_ranges(target, settings.episode_batch_size);
        info!(target, batches = ranges.len(), "Planning episodes");

        let mut planned: Vec<EpisodePlanEntry> = Vec::with_capacity(target as usize);
        let mut chunks: Vec<BatchChunk<EpisodePlanEntry>> = Vec::with_capacity(ranges.len());
        let mut batches = Vec::with_capacity(ranges.len());
        let mut reasoning_brief = None;
        let mut token_usage = None;

        for (start, count) in ranges {
            debug!(batch_start_order = start, batch_count = count, "Requesting batch");
            let contract = EpisodeBatchContract::new(start, count);
            let user_prompt = batch_prompt(input, target, start, count, &planned);
            let output = self
                .run_structured(
                    &contract,
                    prompts::PLAN_EPISODES_SYSTEM,
                    prompts::PLAN_EPISODES_FIX_SYSTEM,
                    user_prompt,
                    Some(batch_max_tokens(count)),
                )
                .await?;

            token_usage = TokenUsage::merge(token_usage, output.token_usage);
            batches.push(BatchReport {
                batch_start_order: start,
                batch_count: count,
                fixed: output.fixed,
                token_usage: output.token_usage,
            });

            let mut batch = output.artifact;
            if chunks.is_empty() {
                reasoning_brief = batch.reasoning_brief.take();
            }
            batch.episodes.sort_by_key(|e| e.order);
            planned.extend(batch.episodes.iter().cloned());
            chunks.push(BatchChunk {
                batch_start_order: start,
                batch_count: count,
                items: batch.episodes,
            });
        }

        let mut operations = Vec::with_capacity(planned.len() + 2);
        for entry in chunks.iter().flat_map(|chunk| chunk.items.iter()) {
            let outline = serde_json::to_value(entry)
                .map_err(|e| JsonError::new(format!("outline of episode {}", entry.order), e))?;
            operations.push(EpisodeOperation::Upsert(EpisodeRecord {
                order: entry.order,
                title: entry.title.clone(),
                summary: entry.logline.clone(),
                outline,
            }));
        }
        operations.push(EpisodeOperation::DeleteAfterOrder(target));
        operations.push(EpisodeOperation::SetWorkflowState(
            EPISODE_PLAN_EDITING.to_string(),
        ));
        self.episodes()
            .transaction(&input.project_id, operations)
            .await?;

        let fixed = batches.iter().any(|b| b.fixed);
        info!(episodes = planned.len(), fixed, "Episode plan persisted");
        Ok(EpisodePlanOutput {
            episode_count: target,
            episodes: planned,
            reasoning_brief,
            batches,
            fixed,
            token_usage,
        })
    }
}
