//! Balanced-span extraction.

use panelsmith_core::JsonKind;
use panelsmith_error::ExtractionErrorKind;

/// The first complete JSON value found in a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractedJson<'a> {
    /// Minimal balanced span, borrowed from the input
    pub json_text: &'a str,
    /// Whether the span is an object or an array
    pub kind: JsonKind,
}

/// Why no JSON span could be extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ExtractFailure {
    /// Input is empty or whitespace
    #[display("empty")]
    Empty,
    /// No `{` or `[` in the input
    #[display("no-json-start")]
    NoJsonStart,
    /// Input ends before the value closes
    #[display("unterminated")]
    Unterminated,
    /// A closer does not match its opener
    #[display("mismatched")]
    Mismatched,
}

impl From<ExtractFailure> for ExtractionErrorKind {
    fn from(failure: ExtractFailure) -> Self {
        match failure {
            ExtractFailure::Empty => ExtractionErrorKind::Empty,
            ExtractFailure::NoJsonStart => ExtractionErrorKind::NoJsonStart,
            ExtractFailure::Unterminated => ExtractionErrorKind::Unterminated,
            ExtractFailure::Mismatched => ExtractionErrorKind::Mismatched,
        }
    }
}

/// Find the first balanced JSON object or array in `text`.
///
/// Scanning starts at the earliest `{` or `[`. Brackets inside string
/// literals, including escaped quotes, never count.
///
/// # Examples
///
/// ```
/// use panelsmith_extraction::{extract_first_json, ExtractFailure};
/// use panelsmith_core::JsonKind;
///
/// let found = extract_first_json(r#"text {"text":"} not end","arr":[1,2,3]} text"#).unwrap();
/// assert_eq!(found.json_text, r#"{"text":"} not end","arr":[1,2,3]}"#);
/// assert_eq!(found.kind, JsonKind::Object);
///
/// assert_eq!(extract_first_json("{\"a\": [1, 2"), Err(ExtractFailure::Unterminated));
/// ```
pub fn extract_first_json(text: &str) -> Result<ExtractedJson<'_>, ExtractFailure> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ExtractFailure::Empty);
    }

    let bytes = trimmed.as_bytes();
    let start = bytes
        .iter()
        .position(|b| *b == b'{' || *b == b'[')
        .ok_or(ExtractFailure::NoJsonStart)?;
    let kind = if bytes[start] == b'{' {
        JsonKind::Object
    } else {
        JsonKind::Array
    };

    // Structural characters are ASCII, so byte scanning never splits a UTF-8 sequence.
    let mut closers: Vec<u8> = Vec::new();
    let mut in_string = false;
    let mut escaping = false;

    for (index, &byte) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaping {
                escaping = false;
            } else if byte == b'\\' {
                escaping = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => closers.push(b'}'),
            b'[' => closers.push(b']'),
            b'}' | b']' => {
                if closers.pop() != Some(byte) {
                    return Err(ExtractFailure::Mismatched);
                }
                if closers.is_empty() {
                    return Ok(ExtractedJson {
                        json_text: &trimmed[start..=index],
                        kind,
                    });
                }
            }
            _ => {}
        }
    }

    Err(ExtractFailure::Unterminated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_object_from_prose() {
        let found = extract_first_json("Here you go: {\"id\": 1} hope it helps").unwrap();
        assert_eq!(found.json_text, "{\"id\": 1}");
        assert_eq!(found.kind, JsonKind::Object);
    }

    #[test]
    fn test_extracts_array_when_bracket_comes_first() {
        let found = extract_first_json("list: [1, {\"a\": 2}] and {\"b\": 3}").unwrap();
        assert_eq!(found.json_text, "[1, {\"a\": 2}]");
        assert_eq!(found.kind, JsonKind::Array);
    }

    #[test]
    fn test_brackets_inside_strings_are_ignored() {
        let text = r#"prefix {"a": "[{]}", "b": "say \"}\" twice"} suffix"#;
        let found = extract_first_json(text).unwrap();
        assert_eq!(found.json_text, r#"{"a": "[{]}", "b": "say \"}\" twice"}"#);
    }

    #[test]
    fn test_code_fence_is_skipped() {
        let found = extract_first_json("```json\n[\"x\"]\n```").unwrap();
        assert_eq!(found.json_text, "[\"x\"]");
    }

    #[test]
    fn test_multibyte_text_around_json() {
        let found = extract_first_json("好的，结果如下：{\"标题\": \"雨夜\"}。").unwrap();
        assert_eq!(found.json_text, "{\"标题\": \"雨夜\"}");
    }

    #[test]
    fn test_failure_reasons() {
        assert_eq!(extract_first_json(""), Err(ExtractFailure::Empty));
        assert_eq!(extract_first_json("  \n\t "), Err(ExtractFailure::Empty));
        assert_eq!(
            extract_first_json("no json here"),
            Err(ExtractFailure::NoJsonStart)
        );
        assert_eq!(
            extract_first_json("{\"a\": [1, 2}"),
            Err(ExtractFailure::Mismatched)
        );
        assert_eq!(
            extract_first_json("{\"a\": \"unclosed"),
            Err(ExtractFailure::Unterminated)
        );
    }

    #[test]
    fn test_failure_maps_to_actionable_message() {
        let kind: ExtractionErrorKind = ExtractFailure::Unterminated.into();
        assert!(format!("{}", kind).contains("max output tokens"));
        assert_eq!(format!("{}", ExtractFailure::NoJsonStart), "no-json-start");
    }
}
