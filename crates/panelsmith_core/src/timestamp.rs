//! ISO-8601 timestamps with millisecond precision.
//!
//! Traces are compared against fixtures produced by other services, so the
//! wire format is fixed to `2024-01-01T00:00:00.000Z`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Format a timestamp as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub fn format(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serde serializer for `#[serde(with = "panelsmith_core::timestamp")]`.
pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format(at))
}

/// Serde deserializer for `#[serde(with = "panelsmith_core::timestamp")]`.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(serde::de::Error::custom)
}
