//! Full parse pipeline: direct parse, repair, extraction.

use crate::{extract_first_json, repair};
use panelsmith_core::JsonKind;
use panelsmith_error::{ExtractionError, ExtractionErrorKind, JsonError, PanelsmithResult};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

const CONTEXT_RADIUS: usize = 90;

/// A value recovered from model output.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedJson {
    /// The parsed value
    pub json: Value,
    /// The exact text that parsed, after repair
    pub extracted_json: String,
}

/// Parse the JSON value a model reply contains.
///
/// Tries, in order: the trimmed text as-is, the repaired text, then the
/// repaired first balanced span. `expected_kind` is enforced on whichever of
/// these succeeds.
///
/// # Errors
///
/// Every failure is an [`ExtractionError`] whose message tells the operator
/// what to change (token limit, model, prompt).
///
/// # Examples
///
/// ```
/// use panelsmith_extraction::parse_json_from_text;
///
/// let parsed = parse_json_from_text(r#"{"a": 1, "b": [1,2,],}"#, None).unwrap();
/// assert_eq!(parsed.json, serde_json::json!({"a": 1, "b": [1, 2]}));
///
/// let err = parse_json_from_text("[1, 2", None).unwrap_err();
/// assert!(format!("{}", err).contains("truncated"));
/// ```
pub fn parse_json_from_text(
    text: &str,
    expected_kind: Option<JsonKind>,
) -> Result<ParsedJson, ExtractionError> {
    let trimmed = text.trim();
    let raw = trimmed.strip_prefix('\u{feff}').unwrap_or(trimmed).trim();
    if raw.is_empty() {
        warn!("Model output is empty");
        return Err(ExtractionError::new(ExtractionErrorKind::Empty));
    }

    if let Ok(json) = serde_json::from_str::<Value>(raw) {
        check_kind(&json, expected_kind)?;
        return Ok(ParsedJson {
            json,
            extracted_json: raw.to_string(),
        });
    }

    let normalized = repair(raw);
    if let Ok(json) = serde_json::from_str::<Value>(&normalized) {
        check_kind(&json, expected_kind)?;
        debug!("Parsed model output after repair");
        return Ok(ParsedJson {
            json,
            extracted_json: normalized,
        });
    }

    let extracted = extract_first_json(raw).map_err(|failure| {
        warn!(reason = %failure, output_length = raw.len(), "No JSON value in model output");
        ExtractionError::new(failure.into())
    })?;

    if let Some(expected) = expected_kind {
        if extracted.kind != expected {
            return Err(kind_mismatch(expected, extracted.kind.as_str()));
        }
    }

    let repaired = repair(extracted.json_text);
    match serde_json::from_str::<Value>(&repaired) {
        Ok(json) => {
            debug!(
                prefix_length = raw.len() - extracted.json_text.len(),
                "Extracted JSON from surrounding text"
            );
            Ok(ParsedJson {
                json,
                extracted_json: repaired,
            })
        }
        Err(e) => {
            let context = byte_offset(&repaired, e.line(), e.column())
                .map(|offset| error_context(&repaired, offset));
            warn!(error = %e, "Extracted JSON does not parse");
            Err(ExtractionError::new(ExtractionErrorKind::Parse {
                message: e.to_string(),
                context,
            }))
        }
    }
}

fn kind_mismatch(expected: JsonKind, actual: &'static str) -> ExtractionError {
    warn!(expected = %expected, actual, "JSON kind mismatch");
    ExtractionError::new(ExtractionErrorKind::KindMismatch {
        expected: expected.as_str(),
        actual,
    })
}

fn check_kind(json: &Value, expected_kind: Option<JsonKind>) -> Result<(), ExtractionError> {
    let Some(expected) = expected_kind else {
        return Ok(());
    };
    let actual = value_kind_name(json);
    if actual == expected.as_str() {
        Ok(())
    } else {
        Err(kind_mismatch(expected, actual))
    }
}

fn value_kind_name(json: &Value) -> &'static str {
    match json {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Parse model output and deserialize it into `T`.
///
/// Returns the typed value and the text it was parsed from.
///
/// # Errors
///
/// Extraction failures as in [`parse_json_from_text`]; a shape mismatch is a [`JsonError`].
pub fn parse_typed_from_text<T: DeserializeOwned>(
    text: &str,
    expected_kind: Option<JsonKind>,
) -> PanelsmithResult<(T, String)> {
    let parsed = parse_json_from_text(text, expected_kind)?;
    let typed = serde_json::from_value(parsed.json)
        .map_err(|e| JsonError::new(std::any::type_name::<T>(), e))?;
    Ok((typed, parsed.extracted_json))
}

// serde_json reports 1-based line and column; line 0 means no position.
fn byte_offset(text: &str, line: usize, column: usize) -> Option<usize> {
    if line == 0 {
        return None;
    }
    let line_start: usize = text
        .split_inclusive('\n')
        .take(line - 1)
        .map(str::len)
        .sum();
    let mut offset = (line_start + column.saturating_sub(1)).min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    Some(offset)
}

fn error_context(text: &str, offset: usize) -> String {
    let chars: Vec<char> = text.chars().filter(|c| *c != '\r').collect();
    let position = text[..offset].chars().filter(|c| *c != '\r').count();
    let start = position.saturating_sub(CONTEXT_RADIUS);
    let end = (position + CONTEXT_RADIUS).min(chars.len());

    let snippet: String = chars[start..end]
        .iter()
        .map(|c| if *c == '\n' { "\\n".to_string() } else { c.to_string() })
        .collect();
    let head = if start > 0 { "…" } else { "" };
    let tail = if end < chars.len() { "…" } else { "" };
    // Caret aligns with characters before the error, escaped newlines counted twice.
    let newlines_before = chars[start..position].iter().filter(|c| **c == '\n').count();
    let caret = head.chars().count() + (position - start) + newlines_before;

    format!("Near: {head}{snippet}{tail}\n      {}^", " ".repeat(caret))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_trailing_commas_are_repaired() {
        let parsed = parse_json_from_text(r#"{"a": 1, "b": [1,2,],}"#, None).unwrap();
        assert_eq!(parsed.json, json!({"a": 1, "b": [1, 2]}));
        assert_eq!(parsed.extracted_json, r#"{"a": 1, "b": [1,2]}"#);
    }

    #[test]
    fn test_braces_in_strings_survive_extraction() {
        let parsed =
            parse_json_from_text(r#"text {"text":"} not end","arr":[1,2,3]} text"#, None).unwrap();
        assert_eq!(parsed.json, json!({"text": "} not end", "arr": [1, 2, 3]}));
    }

    #[test]
    fn test_clean_json_is_returned_verbatim() {
        let parsed = parse_json_from_text("  [1, 2]  ", Some(JsonKind::Array)).unwrap();
        assert_eq!(parsed.extracted_json, "[1, 2]");
    }

    #[test]
    fn test_expected_kind_mismatch() {
        let err = parse_json_from_text("Result: [1, 2] done", Some(JsonKind::Object)).unwrap_err();
        assert_eq!(
            err.kind,
            ExtractionErrorKind::KindMismatch {
                expected: "object",
                actual: "array"
            }
        );
    }

    #[test]
    fn test_whole_text_of_wrong_kind_is_a_mismatch() {
        let err = parse_json_from_text(r#"[{"a": 1}]"#, Some(JsonKind::Object)).unwrap_err();
        assert!(matches!(
            err.kind(),
            ExtractionErrorKind::KindMismatch {
                expected: "object",
                actual: "array"
            }
        ));

        let err = parse_json_from_text("\"just text\"", Some(JsonKind::Array)).unwrap_err();
        assert!(matches!(
            err.kind(),
            ExtractionErrorKind::KindMismatch { actual: "string", .. }
        ));
    }

    #[test]
    fn test_failure_reasons_have_distinct_messages() {
        let empty = parse_json_from_text("   ", None).unwrap_err();
        let no_start = parse_json_from_text("I cannot help with that.", None).unwrap_err();
        let truncated = parse_json_from_text("{\"episodes\": [{\"order\": 1", None).unwrap_err();
        let mismatched = parse_json_from_text("{\"a\": [1}", None).unwrap_err();

        assert_eq!(empty.kind, ExtractionErrorKind::Empty);
        assert_eq!(no_start.kind, ExtractionErrorKind::NoJsonStart);
        assert_eq!(truncated.kind, ExtractionErrorKind::Unterminated);
        assert_eq!(mismatched.kind, ExtractionErrorKind::Mismatched);

        assert!(format!("{}", empty).contains("empty output"));
        assert!(format!("{}", no_start).contains("No JSON start"));
        assert!(format!("{}", truncated).contains("truncated"));
    }

    #[test]
    fn test_residual_parse_error_has_context() {
        let err = parse_json_from_text("answer: {\"a\": tru, \"b\": 2}", None).unwrap_err();
        match err.kind {
            ExtractionErrorKind::Parse { message, context } => {
                assert!(!message.is_empty());
                let context = context.unwrap();
                assert!(context.contains("tru"));
                assert!(context.contains('^'));
            }
            other => panic!("unexpected kind: {other}"),
        }
    }

    #[test]
    fn test_parse_typed() {
        #[derive(serde::Deserialize)]
        struct Shot {
            id: u32,
        }
        let (shot, text) = parse_typed_from_text::<Shot>("ok {\"id\": 7}", None).unwrap();
        assert_eq!(shot.id, 7);
        assert_eq!(text, "{\"id\": 7}");
    }
}
