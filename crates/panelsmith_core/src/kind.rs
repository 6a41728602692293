//! JSON container kinds.

use serde::{Deserialize, Serialize};

/// Top-level shape of a JSON value recovered from model output.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum JsonKind {
    /// `{ ... }`
    #[display("object")]
    Object,
    /// `[ ... ]`
    #[display("array")]
    Array,
}

impl JsonKind {
    /// Lowercase name used in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            JsonKind::Object => "object",
            JsonKind::Array => "array",
        }
    }

    /// Kind opened by a bracket character.
    pub fn from_opening(ch: u8) -> Option<Self> {
        match ch {
            b'{' => Some(JsonKind::Object),
            b'[' => Some(JsonKind::Array),
            _ => None,
        }
    }

    /// Kind of a parsed value; scalars have none.
    pub fn of(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Object(_) => Some(JsonKind::Object),
            serde_json::Value::Array(_) => Some(JsonKind::Array),
            _ => None,
        }
    }
}
