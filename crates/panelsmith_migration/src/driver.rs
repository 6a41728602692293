//! Batch migration of stored shot prompts.

use crate::convert::convert_legacy_shot_prompt_to_v2;
use crate::storyboard::is_storyboard_prompt_v2;
use panelsmith_error::{JsonError, PanelsmithResult};
use panelsmith_interface::{SceneFilter, SceneStore, ShotPromptRow};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};

/// Whether a migration run writes its results.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum MigrationMode {
    /// Count what would change without writing
    #[default]
    DryRun,
    /// Write converted prompts back
    Apply,
}

/// Options for [`migrate_shot_prompts`].
///
/// Writes happen only when `apply` is set and `dry_run` is not.
#[derive(Debug, Clone, PartialEq, Eq, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct MigrationOptions {
    /// Never write, even with `apply`
    pub dry_run: bool,
    /// Write converted prompts
    pub apply: bool,
    /// Maximum scenes to scan; 0 scans all
    pub limit: usize,
    /// Restrict the scan to one project
    #[setters(strip_option, into)]
    pub project_id: Option<String>,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self::dry_run()
    }
}

impl MigrationOptions {
    /// Scan and count without writing.
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            apply: false,
            limit: 0,
            project_id: None,
        }
    }

    /// Scan and write converted prompts.
    pub fn apply() -> Self {
        Self {
            dry_run: false,
            apply: true,
            limit: 0,
            project_id: None,
        }
    }

    /// Effective mode of a run with these options.
    pub fn mode(&self) -> MigrationMode {
        if self.apply && !self.dry_run {
            MigrationMode::Apply
        } else {
            MigrationMode::DryRun
        }
    }
}

/// Counts from one migration run.
///
/// Every scanned row is either migrated or skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[display("mode={} scanned={} migrated={} skipped={}", mode, scanned, migrated, skipped)]
pub struct MigrationStats {
    /// Mode the run used
    pub mode: MigrationMode,
    /// Rows visited
    pub scanned: usize,
    /// Rows converted (and written, in apply mode)
    pub migrated: usize,
    /// Rows left alone
    pub skipped: usize,
}

impl MigrationStats {
    fn new(mode: MigrationMode) -> Self {
        Self {
            mode,
            scanned: 0,
            migrated: 0,
            skipped: 0,
        }
    }
}

/// Why a row was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
enum SkipReason {
    Empty,
    Unparseable,
    AlreadyMigrated,
    Unconvertible,
}

/// Converted prompt text for a row, or why it is skipped.
fn plan_row(row: &ShotPromptRow) -> PanelsmithResult<Result<String, SkipReason>> {
    let text = row.shot_prompt.as_deref().map(str::trim).unwrap_or_default();
    if text.is_empty() {
        return Ok(Err(SkipReason::Empty));
    }
    let Ok(parsed) = serde_json::from_str::<Value>(text) else {
        return Ok(Err(SkipReason::Unparseable));
    };
    if is_storyboard_prompt_v2(&parsed) {
        return Ok(Err(SkipReason::AlreadyMigrated));
    }
    let Some(converted) = convert_legacy_shot_prompt_to_v2(text) else {
        return Ok(Err(SkipReason::Unconvertible));
    };
    let pretty = serde_json::to_string_pretty(&converted)
        .map_err(|e| JsonError::new(format!("shot prompt of scene {}", row.id), e))?;
    Ok(Ok(pretty))
}

/// Convert legacy shot prompts in `store` to the grid format.
///
/// Rows that are empty, unparseable, already migrated or unconvertible are
/// skipped. In apply mode each converted prompt is written back as
/// pretty-printed JSON; a second run then migrates nothing. Storage errors
/// abort the run.
#[instrument(skip(store), fields(mode = %options.mode()))]
pub async fn migrate_shot_prompts(
    store: &dyn SceneStore,
    options: &MigrationOptions,
) -> PanelsmithResult<MigrationStats> {
    let mode = options.mode();
    let filter = SceneFilter::new(options.project_id.clone(), options.limit);
    let rows = store.list_shot_prompts(&filter).await?;
    debug!(rows = rows.len(), "Loaded scenes");

    let mut stats = MigrationStats::new(mode);
    for row in &rows {
        stats.scanned += 1;
        match plan_row(row)? {
            Err(reason) => {
                debug!(scene = %row.id, reason = %reason, "Skipping scene");
                stats.skipped += 1;
            }
            Ok(text) => {
                stats.migrated += 1;
                if mode == MigrationMode::Apply {
                    store.update_shot_prompt(&row.id, &text).await?;
                    debug!(scene = %row.id, "Migrated scene");
                }
            }
        }
    }

    info!(
        mode = %stats.mode,
        scanned = stats.scanned,
        migrated = stats.migrated,
        skipped = stats.skipped,
        "Shot prompt migration finished"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_requires_apply_without_dry_run() {
        assert_eq!(MigrationOptions::default().mode(), MigrationMode::DryRun);
        assert_eq!(MigrationOptions::apply().mode(), MigrationMode::Apply);
        assert_eq!(
            MigrationOptions::apply().with_dry_run(true).mode(),
            MigrationMode::DryRun
        );
        assert_eq!(
            MigrationOptions::dry_run().with_apply(true).mode(),
            MigrationMode::DryRun
        );
    }

    #[test]
    fn test_stats_display() {
        let stats = MigrationStats {
            mode: MigrationMode::Apply,
            scanned: 4,
            migrated: 1,
            skipped: 3,
        };
        assert_eq!(stats.to_string(), "mode=apply scanned=4 migrated=1 skipped=3");
        assert_eq!(MigrationMode::DryRun.to_string(), "dry-run");
    }

    #[test]
    fn test_plan_row_reasons() {
        let row = |text: Option<&str>| ShotPromptRow {
            id: "s".to_string(),
            project_id: "p".to_string(),
            shot_prompt: text.map(str::to_string),
        };
        assert_eq!(plan_row(&row(None)).unwrap(), Err(SkipReason::Empty));
        assert_eq!(plan_row(&row(Some("  \n"))).unwrap(), Err(SkipReason::Empty));
        assert_eq!(plan_row(&row(Some("{bad"))).unwrap(), Err(SkipReason::Unparseable));
        assert_eq!(
            plan_row(&row(Some("{\"camera\": {}}"))).unwrap(),
            Err(SkipReason::Unconvertible)
        );
        let migrated = plan_row(&row(Some("{\"keyframes\": {}}"))).unwrap().unwrap();
        assert!(migrated.contains("\n  \"shots\""));
    }
}
