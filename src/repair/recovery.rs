//! Second-tier emergency recovery for generative output the ordered passes
//! could not make parseable.

use serde_json::Value;

/// Forcibly close unmatched braces on a truncated object.
pub(crate) fn force_close(text: &str) -> String {
    if !text.starts_with('{') {
        return text.to_string();
    }
    let open = text.matches('{').count();
    let close = text.matches('}').count();
    if open <= close {
        return text.to_string();
    }
    let mut closed = text.to_string();
    closed.extend(std::iter::repeat('}').take(open - close));
    closed
}

/// Truncation recovery: walk the text backward one line at a time, find the
/// last syntactically complete key-value pair at nesting depth 1, cut there
/// and close the object. Returns the first candidate that strictly parses.
pub(crate) fn recover_truncated(text: &str) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();
    for end in (1..=lines.len()).rev() {
        let candidate = lines[..end].join("\n");

        let mut depth = 0i32;
        let mut last_complete = None;
        for (i, ch) in candidate.char_indices() {
            match ch {
                '{' => depth += 1,
                '}' => depth -= 1,
                ',' if depth == 1 => last_complete = Some(i),
                _ => {}
            }
        }

        if let Some(cut) = last_complete {
            let truncated = format!("{}}}", &candidate[..cut]);
            if serde_json::from_str::<Value>(&truncated).is_ok() {
                return Some(truncated);
            }
        }
    }
    None
}
