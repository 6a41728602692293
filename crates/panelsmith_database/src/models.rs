//! Row types for the diesel schema.

use crate::schema::{artifacts, episodes, scenes};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use panelsmith_interface::{EpisodeRecord, ShotPromptRow};
use serde_json::Value;

/// Episode row as stored.
#[derive(Debug, Clone, Queryable)]
#[diesel(table_name = episodes)]
pub struct EpisodeRow {
    pub project_id: String,
    pub order_no: i32,
    pub title: String,
    pub summary: String,
    pub outline: Value,
    pub updated_at: DateTime<Utc>,
}

impl From<EpisodeRow> for EpisodeRecord {
    fn from(row: EpisodeRow) -> Self {
        Self {
            order: u32::try_from(row.order_no).unwrap_or_default(),
            title: row.title,
            summary: row.summary,
            outline: row.outline,
        }
    }
}

/// Insertable/updatable episode.
#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = episodes)]
pub struct NewEpisode<'a> {
    pub project_id: &'a str,
    pub order_no: i32,
    pub title: &'a str,
    pub summary: &'a str,
    pub outline: &'a Value,
    pub updated_at: DateTime<Utc>,
}

/// Scene row as stored.
#[derive(Debug, Clone, Queryable)]
#[diesel(table_name = scenes)]
pub struct SceneRow {
    pub id: String,
    pub project_id: String,
    pub shot_prompt: Option<String>,
}

impl From<SceneRow> for ShotPromptRow {
    fn from(row: SceneRow) -> Self {
        Self {
            id: row.id,
            project_id: row.project_id,
            shot_prompt: row.shot_prompt,
        }
    }
}

/// Insertable/updatable artifact.
#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = artifacts)]
pub struct NewArtifact<'a> {
    pub kind: &'a str,
    pub owner_id: &'a str,
    pub value: &'a Value,
    pub updated_at: DateTime<Utc>,
}
