//! `extract` command handler.

use super::commands::ExpectedKind;
use panelsmith::{PanelsmithResult, parse_json_from_text};
use std::io::Read;
use std::path::Path;

/// Read a model reply from `file` or stdin.
pub fn read_input(file: Option<&Path>) -> std::io::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

/// Recovered JSON of `text`, pretty-printed.
pub fn extract_pretty(text: &str, expect: Option<ExpectedKind>) -> PanelsmithResult<String> {
    let parsed = parse_json_from_text(text, expect.map(Into::into))?;
    let pretty = serde_json::to_string_pretty(&parsed.json)
        .map_err(|e| panelsmith::JsonError::new("extracted value", e))?;
    Ok(pretty)
}

/// Print the JSON value recovered from a model reply.
pub fn handle_extract(
    file: Option<&Path>,
    expect: Option<ExpectedKind>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let text = read_input(file)?;
    tracing::debug!(length = text.len(), "Read model reply");
    println!("{}", extract_pretty(&text, expect)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_extract_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Sure! ```json\n{{\"title\": \"Tides\", \"tags\": [\"noir\",],}}\n```").unwrap();

        let text = read_input(Some(file.path())).unwrap();
        let pretty = extract_pretty(&text, Some(ExpectedKind::Object)).unwrap();

        let value: serde_json::Value = serde_json::from_str(&pretty).unwrap();
        assert_eq!(value["title"], "Tides");
        assert_eq!(value["tags"][0], "noir");
    }

    #[test]
    fn test_kind_mismatch_is_an_error() {
        let err = extract_pretty("{\"a\": 1}", Some(ExpectedKind::Array)).unwrap_err();
        assert!(err.is_fixable());
    }
}
