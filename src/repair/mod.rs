//! Text repair engine: turns near-JSON generative output into valid JSON
//!
//! The upstream generator routinely wraps its JSON in markdown fences or
//! conversation, leaves keys and enum values unquoted, zero-pads numbers,
//! adds trailing commas, or truncates the object mid-field. This module runs
//! an ordered sequence of deterministic passes over the text, then a strict
//! `serde_json` parse as the validation gate, then (only on failure) a
//! second-tier emergency recovery. It never panics and never fabricates data:
//! if nothing parses, the caller gets a `RepairError` carrying the original
//! text and falls back to deterministic extraction.

mod passes;
mod recovery;

use serde_json::Value;
use tracing::debug;

use crate::error::RepairError;
use passes::RepairRules;

/// Reusable repair engine with pre-compiled pass rules.
pub struct RepairEngine {
    rules: RepairRules,
}

impl Default for RepairEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RepairEngine {
    pub fn new() -> Self {
        Self {
            rules: RepairRules::new(),
        }
    }

    /// Repair `raw` into a JSON object value.
    ///
    /// Already-valid input is returned as parsed, byte-for-byte untouched by
    /// the heuristics; the passes only run once the strict parse has failed.
    pub fn repair(&self, raw: &str) -> Result<Value, RepairError> {
        let trimmed = raw.trim();
        if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
            if value.is_object() {
                return Ok(value);
            }
        }

        // Ordered passes: noise, numbers, keys, enums, commas.
        let text = self.rules.strip_noise(trimmed);
        let text = self.rules.normalize_numbers(&text);
        let text = self.rules.quote_bare_keys(&text);
        let text = self.rules.quote_bare_enums(&text);
        let text = self.rules.strip_trailing_commas(&text);

        // Structural passes: locate the object, then balance truncation.
        let candidate = if text.starts_with('{') {
            text.clone()
        } else {
            match passes::first_object_span(&text) {
                Some(span) => span.to_string(),
                None => {
                    return Err(RepairError::Unrecoverable {
                        original: raw.to_string(),
                    })
                }
            }
        };
        let candidate = passes::balance_brackets(&candidate);

        if let Ok(value) = serde_json::from_str::<Value>(&candidate) {
            return Ok(value);
        }

        // Second tier: forced brace closing, then the backward truncation walk.
        let forced = recovery::force_close(&candidate);
        if let Ok(value) = serde_json::from_str::<Value>(&forced) {
            debug!("repair succeeded via forced brace closing");
            return Ok(value);
        }

        if let Some(recovered) = recovery::recover_truncated(&candidate) {
            debug!("repair succeeded via truncation recovery");
            if let Ok(value) = serde_json::from_str::<Value>(&recovered) {
                return Ok(value);
            }
        }

        Err(RepairError::Unrecoverable {
            original: raw.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> RepairEngine {
        RepairEngine::new()
    }

    #[test]
    fn valid_json_passes_through_unchanged() {
        let raw = r#"{"age": 45, "gender": "male", "procedure": "knee surgery"}"#;
        let value = engine().repair(raw).unwrap();
        assert_eq!(value["age"], 45);
        assert_eq!(value["procedure"], "knee surgery");
    }

    #[test]
    fn valid_json_with_colon_inside_string_survives() {
        // A strict parse short-circuits the heuristics, so colons inside
        // string values never trigger the bare-key pass.
        let raw = r#"{"match_reason": "clause 3.1: waiting period passed"}"#;
        let value = engine().repair(raw).unwrap();
        assert_eq!(value["match_reason"], "clause 3.1: waiting period passed");
    }

    #[test]
    fn fenced_json_matches_unfenced_result() {
        let plain = r#"{"decision": "approved", "confidence": 0.8}"#;
        let fenced = format!("```json\n{}\n```", plain);
        assert_eq!(
            engine().repair(plain).unwrap(),
            engine().repair(&fenced).unwrap()
        );
    }

    #[test]
    fn repairs_unquoted_keys_and_enums() {
        let raw = "{decision: approved, confidence: 0.8, gender: male}";
        let value = engine().repair(raw).unwrap();
        assert_eq!(value["decision"], "approved");
        assert_eq!(value["gender"], "male");
        assert_eq!(value["confidence"], 0.8);
    }

    #[test]
    fn repairs_zero_padded_confidence() {
        let value = engine().repair("{\"confidence\": 00.95}").unwrap();
        assert_eq!(value["confidence"], 0.95);
    }

    #[test]
    fn repairs_all_zeros_literal() {
        let value = engine().repair("{\"age\": null, \"months\": 00}").unwrap();
        assert_eq!(value["months"], 0);
    }

    #[test]
    fn repairs_unquoted_sum_insured_amount() {
        let value = engine()
            .repair("{\"amount\": Up to Sum Insured, \"confidence\": 0.8}")
            .unwrap();
        assert_eq!(value["amount"], "Up to Sum Insured");
    }

    #[test]
    fn repairs_trailing_comma() {
        let value = engine().repair("{\"age\": 45,}").unwrap();
        assert_eq!(value["age"], 45);
    }

    #[test]
    fn extracts_object_from_conversational_wrapper() {
        let raw = "Sure! Here is the JSON you asked for:\n\n{\"age\": 45}\n\nThank you";
        let value = engine().repair(raw).unwrap();
        assert_eq!(value["age"], 45);
    }

    #[test]
    fn balances_object_missing_final_brace() {
        let value = engine()
            .repair("{\"age\": 45, \"justification\": [{\"clause\": \"Code-Excl03\"}]")
            .unwrap();
        assert_eq!(value["justification"][0]["clause"], "Code-Excl03");
    }

    #[test]
    fn recovers_object_truncated_mid_value() {
        let raw = "{\"age\": 45,\n\"gender\": \"male\",\n\"procedure\": \"knee su";
        let value = engine().repair(raw).unwrap();
        assert_eq!(value["age"], 45);
        assert_eq!(value["gender"], "male");
    }

    #[test]
    fn unrecoverable_text_returns_original_in_error() {
        let raw = "I am sorry, I cannot help with that request.";
        let err = engine().repair(raw).unwrap_err();
        assert_eq!(err.original(), raw);
    }

    #[test]
    fn empty_input_is_unrecoverable() {
        assert!(engine().repair("").is_err());
        assert!(engine().repair("   \n  ").is_err());
    }

    #[test]
    fn repair_is_idempotent_on_its_own_output() {
        let raw = "{decision: approved, confidence: 00.8,}";
        let first = engine().repair(raw).unwrap();
        let reserialized = serde_json::to_string(&first).unwrap();
        assert_eq!(engine().repair(&reserialized).unwrap(), first);
    }
}
