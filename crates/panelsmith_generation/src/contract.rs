//! Contracts built from serde shapes plus [`ArtifactRules`].

use crate::artifacts::ArtifactRules;
use panelsmith_core::JsonKind;
use panelsmith_interface::Contract;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;

/// Contract that deserializes a candidate into `T` and applies its rules.
///
/// # Examples
///
/// ```
/// use panelsmith_generation::{SchemaContract, SceneSoundDesign};
/// use panelsmith_interface::Contract;
/// use serde_json::json;
///
/// let contract = SchemaContract::<SceneSoundDesign>::object("scene_sound_design");
/// assert!(contract.validate(&json!({"cues": []})).is_err());
/// assert!(contract
///     .validate(&json!({"cues": [{"id": "c1", "type": "sfx", "description": "Rain"}]}))
///     .is_ok());
/// ```
pub struct SchemaContract<T> {
    name: &'static str,
    kind: JsonKind,
    hint: Option<&'static str>,
    _artifact: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for SchemaContract<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaContract")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

impl<T> SchemaContract<T> {
    /// Contract for a top-level object.
    pub fn object(name: &'static str) -> Self {
        Self {
            name,
            kind: JsonKind::Object,
            hint: None,
            _artifact: PhantomData,
        }
    }

    /// Contract for a top-level array.
    pub fn array(name: &'static str) -> Self {
        Self {
            kind: JsonKind::Array,
            ..Self::object(name)
        }
    }

    /// Extra instruction for the fix prompt.
    pub fn with_hint(mut self, hint: &'static str) -> Self {
        self.hint = Some(hint);
        self
    }
}

/// Deserialize a candidate, reporting a shape mismatch as a single issue.
pub(crate) fn deserialize_candidate<T: DeserializeOwned>(candidate: &Value) -> Result<T, Vec<String>> {
    T::deserialize(candidate).map_err(|e| vec![format!("$: {}", e)])
}

impl<T> Contract for SchemaContract<T>
where
    T: DeserializeOwned + ArtifactRules + Send,
{
    type Output = T;

    fn name(&self) -> &str {
        self.name
    }

    fn expected_kind(&self) -> JsonKind {
        self.kind
    }

    fn validate(&self, candidate: &Value) -> Result<T, Vec<String>> {
        let artifact: T = deserialize_candidate(candidate)?;
        let issues = artifact.check();
        if issues.is_empty() {
            Ok(artifact)
        } else {
            Err(issues)
        }
    }

    fn fix_hint(&self) -> Option<String> {
        self.hint.map(str::to_string)
    }
}
