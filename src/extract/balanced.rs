//! Locating a balanced JSON object inside free-form text.

use crate::core::ExtractError;

use serde_json::{Map, Value};

/// The key that identifies a scan result object.
pub const STATUS_MARKER: &str = "status";

/// Returns the last complete top-level object in `text` that contains
/// `marker` as a key.
///
/// Braces inside JSON strings (including escaped quotes) do not count
/// towards nesting. Objects nested inside a complete candidate are never
/// returned on their own.
///
/// ```rust
/// use sentinel_bridge::extract::{extract_object, STATUS_MARKER};
///
/// let text = r#"booting vm... {"status":"ok","n":{"a":1}} done"#;
/// assert_eq!(
///     extract_object(text, STATUS_MARKER).unwrap(),
///     r#"{"status":"ok","n":{"a":1}}"#
/// );
/// ```
///
/// # Errors
///
/// - `Unbalanced` - no complete candidate exists, but an object holding the
///   marker starts and never closes.
/// - `MarkerNotFound` - nothing resembling a result object is present.
pub fn extract_object<'a>(text: &'a str, marker: &str) -> Result<&'a str, ExtractError> {
    let (candidates, first_unclosed) = top_level_objects(text.as_bytes());

    if let Some(&(start, end)) = candidates
        .iter()
        .rev()
        .find(|&&(start, end)| has_key(&text[start..=end], marker))
    {
        return Ok(&text[start..=end]);
    }

    match (first_unclosed, last_key_position(text, marker)) {
        (Some(start), Some(key)) if start < key => Err(ExtractError::Unbalanced { start }),
        _ => Err(ExtractError::MarkerNotFound {
            marker: marker.to_string(),
        }),
    }
}

/// Parses an extracted fragment into a JSON object.
///
/// # Errors
///
/// Returns `Malformed` if the fragment is not a valid JSON object.
pub fn parse_object(fragment: &str) -> Result<Map<String, Value>, ExtractError> {
    match serde_json::from_str::<Value>(fragment) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ExtractError::Malformed {
            reason: "result is not a JSON object".to_string(),
        }),
        Err(e) => Err(ExtractError::Malformed {
            reason: e.to_string(),
        }),
    }
}

/// Extracts and parses the result object in one step.
pub fn extract_result(text: &str, marker: &str) -> Result<Map<String, Value>, ExtractError> {
    extract_object(text, marker).and_then(parse_object)
}

/// Collects the outermost complete objects in one pass, in order, plus
/// the offset of the earliest brace that never closes.
///
/// Quotes only open strings inside an object, and a raw newline ends any
/// string, so stray quotes in progress text cannot swallow the output.
/// `{`, `}`, `"` and `\` are ASCII and never occur inside a multi-byte
/// UTF-8 sequence, so the offsets are char boundaries.
fn top_level_objects(bytes: &[u8]) -> (Vec<(usize, usize)>, Option<usize>) {
    let mut open = Vec::new();
    let mut spans: Vec<(usize, usize)> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if b == b'\n' {
                in_string = false;
                escaped = false;
            } else if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' if !open.is_empty() => in_string = true,
            b'{' => open.push(i),
            b'}' => {
                if let Some(start) = open.pop() {
                    // Spans opened after `start` are nested in this one.
                    while spans.last().is_some_and(|&(s, _)| s > start) {
                        spans.pop();
                    }
                    spans.push((start, i));
                }
            }
            _ => {}
        }
    }

    (spans, open.first().copied())
}

/// Returns the offset of the last `"marker"` that is followed by a colon.
fn last_key_position(text: &str, marker: &str) -> Option<usize> {
    let needle = format!("\"{marker}\"");
    text.match_indices(&needle)
        .filter(|(i, _)| text[i + needle.len()..].trim_start().starts_with(':'))
        .map(|(i, _)| i)
        .last()
}

/// Returns `true` if `fragment` contains `"marker"` followed by a colon.
fn has_key(fragment: &str, marker: &str) -> bool {
    let needle = format!("\"{marker}\"");
    fragment.match_indices(&needle).any(|(i, _)| {
        fragment[i + needle.len()..]
            .trim_start()
            .starts_with(':')
    })
}
