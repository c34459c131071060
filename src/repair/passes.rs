//! Individual repair passes over near-JSON text
//!
//! Each pass is a deterministic, idempotent text transform. Order matters and
//! is fixed by the composing `repair` function: noise stripping first, then
//! token-level fixes, then structural extraction and balancing. Keeping the
//! passes as standalone functions keeps every heuristic independently
//! testable.

use regex::Regex;

/// Compiled regexes shared by the passes. Built once per repair engine.
pub(crate) struct RepairRules {
    fences: Regex,
    boilerplate: Regex,
    zero_padded_float: Regex,
    zero_padded_int: Regex,
    bare_key: Regex,
    bare_enum: Regex,
    bare_sum_insured: Regex,
    trailing_comma: Regex,
}

impl RepairRules {
    pub(crate) fn new() -> Self {
        // These patterns are infallible by construction; compiling them at
        // startup keeps the per-call path allocation-only.
        Self {
            fences: Regex::new(r"(?i)```json|```").expect("valid fence pattern"),
            boilerplate: Regex::new(
                r"(?i)end of document|thank you|system:|assistant:|here is|here's",
            )
            .expect("valid boilerplate pattern"),
            zero_padded_float: Regex::new(r":\s*0+(\d+\.\d+)").expect("valid float pattern"),
            zero_padded_int: Regex::new(r":\s*0+(\d+)").expect("valid int pattern"),
            bare_key: Regex::new(r"([A-Za-z_]\w*)\s*:").expect("valid key pattern"),
            bare_enum: Regex::new(r":\s*(approved|rejected|conditional|male|female)\b")
                .expect("valid enum pattern"),
            bare_sum_insured: Regex::new(r":\s*Up to Sum Insured").expect("valid amount pattern"),
            trailing_comma: Regex::new(r",(\s*[}\]])").expect("valid comma pattern"),
        }
    }

    /// Pass 1: drop markdown fences and conversational boilerplate.
    pub(crate) fn strip_noise(&self, text: &str) -> String {
        let text = self.fences.replace_all(text, "");
        let text = self.boilerplate.replace_all(&text, "");
        text.trim().to_string()
    }

    /// Pass 2: collapse zero-padded numeric literals (`00.95` -> `0.95`,
    /// `007` -> `7`) without touching legitimate zero values.
    pub(crate) fn normalize_numbers(&self, text: &str) -> String {
        let text = self.zero_padded_float.replace_all(text, ": $1");
        self.zero_padded_int.replace_all(&text, ": $1").into_owned()
    }

    /// Pass 3: quote bare identifier-style keys (`age:` -> `"age":`).
    ///
    /// Already-quoted keys are untouched: the closing quote between the
    /// identifier and the colon prevents a match.
    pub(crate) fn quote_bare_keys(&self, text: &str) -> String {
        self.bare_key.replace_all(text, "\"${1}\":").into_owned()
    }

    /// Pass 4: quote known bare enum-like values the generator habitually
    /// emits unquoted.
    pub(crate) fn quote_bare_enums(&self, text: &str) -> String {
        let text = self.bare_enum.replace_all(text, ": \"${1}\"");
        self.bare_sum_insured
            .replace_all(&text, ": \"Up to Sum Insured\"")
            .into_owned()
    }

    /// Pass 5: remove trailing commas before a closing brace or bracket.
    pub(crate) fn strip_trailing_commas(&self, text: &str) -> String {
        self.trailing_comma.replace_all(text, "${1}").into_owned()
    }
}

/// Pass 6: locate the first `{...}` span when the text does not begin with an
/// object. Returns the span up to the matching close brace, or from the first
/// `{` to the end when the object is truncated.
pub(crate) fn first_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    for (offset, ch) in text[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    Some(&text[start..])
}

/// Pass 7: append enough `]`/`}` to balance counted brackets and braces of a
/// truncated object. Counting is naive: brace characters inside string
/// values are counted too.
pub(crate) fn balance_brackets(text: &str) -> String {
    if !text.starts_with('{') {
        return text.to_string();
    }
    let open_braces = text.matches('{').count().saturating_sub(text.matches('}').count());
    let open_brackets = text.matches('[').count().saturating_sub(text.matches(']').count());
    if open_braces == 0 && open_brackets == 0 {
        return text.to_string();
    }
    let mut balanced = text.to_string();
    balanced.extend(std::iter::repeat(']').take(open_brackets));
    balanced.extend(std::iter::repeat('}').take(open_braces));
    balanced
}
