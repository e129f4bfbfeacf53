//! Best-effort pickup of a JSON object embedded in free-form model output

use serde_json::{Map, Value};

/// Marker the conversion prompt ends with; model output usually echoes it.
const JSON_MARKER: &str = "JSON:";

/// Returns the first balanced `{...}` span in `text`.
///
/// Braces inside JSON string literals (including escaped quotes) do not
/// count toward the depth. An opening brace that is never closed is skipped
/// and scanning resumes from the next one.
pub fn find_object_span(text: &str) -> Option<&str> {
    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find('{') {
        let start = search_from + offset;
        if let Some(end) = balanced_end(&text[start..]) {
            return Some(&text[start..start + end]);
        }
        search_from = start + 1;
    }
    None
}

/// Byte length of the balanced object starting at `text[0] == '{'`.
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx + ch.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

/// Parses the first JSON object found after the last `JSON:` marker. When
/// there is no marker, or the text after it holds no object (the marker sat
/// inside a string value), the whole output is scanned.
pub fn parse_object(output: &str) -> Option<Map<String, Value>> {
    let tail = output.rsplit(JSON_MARKER).next().unwrap_or(output);
    let span = find_object_span(tail).or_else(|| find_object_span(output))?;
    match serde_json::from_str::<Value>(span) {
        Ok(Value::Object(object)) => Some(object),
        Ok(_) => None,
        Err(e) => {
            log::debug!("Discarding malformed JSON span: {}", e);
            None
        }
    }
}
