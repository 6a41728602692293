//! Structural contracts.

use panelsmith_core::JsonKind;
use serde_json::Value;

/// A named schema a candidate value must satisfy to become an artifact.
///
/// `validate` returns the typed artifact, or one issue per violation
/// formatted as `path: message`.
pub trait Contract: Send + Sync {
    /// Typed artifact produced on success.
    type Output: Send;

    /// Contract name used in errors and logs.
    fn name(&self) -> &str;

    /// Expected top-level JSON kind.
    fn expected_kind(&self) -> JsonKind {
        JsonKind::Object
    }

    /// Check a candidate value.
    fn validate(&self, candidate: &Value) -> Result<Self::Output, Vec<String>>;

    /// Extra instructions appended to the fix prompt.
    fn fix_hint(&self) -> Option<String> {
        None
    }
}
