//! Idempotent textual repairs for near-JSON.

const BOM: char = '\u{feff}';

/// Normalize common model quirks so the text parses as JSON.
///
/// Applied in order:
///
/// 1. trim surrounding whitespace and a leading byte-order mark
/// 2. curly quotes become ASCII quotes, only when the text has no ASCII `"`
///    (otherwise they are content, as in CJK dialogue, and are kept)
/// 3. raw newlines and tabs inside string literals are escaped, raw `\r` dropped
/// 4. commas directly before `}` or `]` outside strings are removed
///
/// `repair(repair(x)) == repair(x)` for every input.
///
/// # Examples
///
/// ```
/// use panelsmith_extraction::repair;
///
/// assert_eq!(repair("{\"a\": [1,2,],}"), "{\"a\": [1,2]}");
/// assert_eq!(repair("{“a”: “b”}"), "{\"a\": \"b\"}");
/// assert_eq!(repair("{\"line\": \"他说：“走吧”\"}"), "{\"line\": \"他说：“走吧”\"}");
/// ```
pub fn repair(text: &str) -> String {
    let stripped = text.trim();
    let stripped = stripped.strip_prefix(BOM).unwrap_or(stripped).trim();
    let quoted = normalize_smart_quotes(stripped);
    let escaped = escape_control_chars_in_strings(&quoted);
    remove_trailing_commas(&escaped)
}

fn normalize_smart_quotes(text: &str) -> String {
    if text.contains('"') {
        return text.to_string();
    }
    text.chars()
        .map(|ch| match ch {
            '\u{201c}' | '\u{201d}' | '\u{201e}' | '\u{201f}' => '"',
            '\u{2018}' | '\u{2019}' => '\'',
            other => other,
        })
        .collect()
}

fn escape_control_chars_in_strings(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaping = false;

    for ch in text.chars() {
        if !in_string {
            if ch == '"' {
                in_string = true;
            }
            out.push(ch);
            continue;
        }

        if escaping {
            escaping = false;
            out.push(ch);
            continue;
        }

        match ch {
            '\\' => {
                escaping = true;
                out.push(ch);
            }
            '"' => {
                in_string = false;
                out.push(ch);
            }
            '\n' => out.push_str("\\n"),
            '\r' => {}
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }

    out
}

fn remove_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaping = false;

    for (index, &ch) in chars.iter().enumerate() {
        if in_string {
            if escaping {
                escaping = false;
            } else if ch == '\\' {
                escaping = true;
            } else if ch == '"' {
                in_string = false;
            }
            out.push(ch);
            continue;
        }

        if ch == '"' {
            in_string = true;
            out.push(ch);
            continue;
        }

        if ch == ',' {
            // Runs like `,,]` collapse in one pass.
            let next = chars[index + 1..]
                .iter()
                .find(|c| !c.is_whitespace() && **c != ',');
            if matches!(next, Some('}') | Some(']')) {
                continue;
            }
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_bom_and_whitespace() {
        assert_eq!(repair("  \u{feff} {\"a\":1} \n"), "{\"a\":1}");
    }

    #[test]
    fn test_removes_trailing_commas_outside_strings() {
        assert_eq!(repair("{\"a\": 1, \"b\": [1,2,],}"), "{\"a\": 1, \"b\": [1,2]}");
        assert_eq!(repair("[1,\n  ]"), "[1\n  ]");
        assert_eq!(repair("{\"s\": \"a,}\"}"), "{\"s\": \"a,}\"}");
    }

    #[test]
    fn test_escapes_raw_control_chars_in_strings() {
        assert_eq!(repair("{\"a\": \"x\ny\r\tz\"}"), "{\"a\": \"x\\ny\\tz\"}");
        assert_eq!(repair("{\n\"a\": 1\n}"), "{\n\"a\": 1\n}");
    }

    #[test]
    fn test_smart_quotes_replaced_only_as_delimiters() {
        assert_eq!(repair("{“name”: “Tom’s”}"), "{\"name\": \"Tom's\"}");
        let cjk = "{\"dialogue\": \"她低声说：“别回头。”‘嗯’\"}";
        assert_eq!(repair(cjk), cjk);
    }

    #[test]
    fn test_cjk_payload_parses_after_repair() {
        let text = "{\"scenes\": [{\"line\": \"“你来了。”他笑着说，“我等了很久。”\",},]}";
        let value: serde_json::Value = serde_json::from_str(&repair(text)).unwrap();
        assert_eq!(value["scenes"][0]["line"], "“你来了。”他笑着说，“我等了很久。”");
    }

    #[test]
    fn test_repair_is_idempotent() {
        let samples = [
            "\u{feff}{\"a\": [1,,],}",
            "{“k”: “v”,}",
            "{\"a\": \"line\nbreak\",\r\n}",
            "{\"a\": \"ends with backslash \\\\\", \"b\": [,]}",
            "prose {\"x\": 1,} more prose",
            "",
        ];
        for sample in samples {
            let once = repair(sample);
            assert_eq!(repair(&once), once, "not idempotent for {sample:?}");
        }
    }
}
