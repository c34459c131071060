//! User-facing explanation rendering
//!
//! Pure templating over the record and verdict. Rejections pick a
//! sub-template by inspecting the primary reason text (waiting period, then
//! pre-existing, then age, then generic). A fixed next-steps suffix is keyed
//! on the decision, and a support-contact hint is appended when confidence is
//! low.

use crate::models::{Decision, DecisionResult, QueryRecord};

/// Confidence below this adds a "contact support" hint.
const LOW_CONFIDENCE: f32 = 0.7;

/// Render the explanation string for a verdict. Total and deterministic.
pub fn render(record: &QueryRecord, result: &DecisionResult) -> String {
    let procedure = &record.procedure;
    let duration = record.policy_duration_months;
    let primary_reason = result
        .justification
        .first()
        .map(|j| j.match_reason.as_str())
        .unwrap_or("");
    let reason_lower = primary_reason.to_lowercase();

    let mut response = match result.decision {
        Decision::Approved => {
            let mut text = format!(
                "**Good news!** Your {} is covered under your policy.",
                procedure
            );
            if let Some(amount) = &result.amount {
                text.push_str(&format!(" Coverage amount: {}.", amount));
            }
            if duration >= 1 {
                text.push_str(&format!(
                    " Since your policy has been active for {} months, the waiting period requirements have been met.",
                    duration
                ));
            }
            if reason_lower.contains("waiting period passed") {
                text.push_str(" All waiting periods have been satisfied.");
            }
            text
        }
        Decision::Rejected => {
            let mut text = format!(
                "**Unfortunately**, your {} claim cannot be approved at this time.",
                procedure
            );
            if reason_lower.contains("waiting period") {
                text.push_str(&format!(
                    " Your policy has been active for only {} months, but the required waiting period has not been completed.",
                    duration
                ));
            } else if reason_lower.contains("pre-existing") {
                text.push_str(
                    " This appears to be related to a pre-existing condition, which has a longer waiting period.",
                );
            } else if reason_lower.contains("age") {
                text.push_str(
                    " Additional medical review may be required due to age-related factors.",
                );
            } else {
                text.push_str(&format!(" Reason: {}", primary_reason));
            }
            text
        }
        Decision::Conditional => {
            let mut text = format!("**Conditional approval** for your {}.", procedure);
            if let Some(amount) = &result.amount {
                text.push_str(&format!(" Coverage: {}.", amount));
            }
            text.push_str(
                " Additional documentation or medical review may be required before final approval.",
            );
            if !primary_reason.is_empty() {
                text.push_str(&format!(" {}", primary_reason));
            }
            text
        }
        Decision::Error => format!(
            "We've reviewed your {} request but need more information to make a determination.",
            procedure
        ),
    };

    if result.confidence < LOW_CONFIDENCE {
        response.push_str(" Please contact customer service for final confirmation.");
    }

    match result.decision {
        Decision::Approved => response.push_str(
            "\n\n**Next steps:** You can proceed with your treatment. Keep all medical bills and documents for claim submission.",
        ),
        Decision::Rejected => response.push_str(
            "\n\n**Next steps:** Contact customer service for more details or wait for the required waiting period to complete.",
        ),
        Decision::Conditional => response.push_str(
            "\n\n**Next steps:** Please submit additional medical documentation as requested by our claims team.",
        ),
        Decision::Error => {}
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::decide;
    use crate::models::Gender;

    fn record(age: Option<u32>, procedure: &str, months: u32) -> QueryRecord {
        QueryRecord {
            age,
            gender: Gender::Other,
            procedure: procedure.to_string(),
            location: "unknown".to_string(),
            policy_duration_months: months,
        }
    }

    #[test]
    fn approved_narrative_mentions_amount_and_duration() {
        let r = record(Some(45), "knee surgery", 6);
        let result = decide(&r);
        let text = render(&r, &result);
        assert!(text.contains("Good news!"));
        assert!(text.contains("knee surgery"));
        assert!(text.contains("Up to Sum Insured"));
        assert!(text.contains("active for 6 months"));
        assert!(text.contains("All waiting periods have been satisfied."));
        assert!(text.contains("**Next steps:** You can proceed"));
    }

    #[test]
    fn waiting_period_rejection_uses_waiting_template() {
        let r = record(Some(45), "knee surgery", 0);
        let result = decide(&r);
        let text = render(&r, &result);
        assert!(text.contains("Unfortunately"));
        assert!(text.contains("active for only 0 months"));
        assert!(text.contains("**Next steps:** Contact customer service"));
    }

    #[test]
    fn pre_existing_rejection_uses_pre_existing_template() {
        let r = record(Some(50), "pre-existing diabetes treatment", 6);
        let result = decide(&r);
        let text = render(&r, &result);
        assert!(text.contains("pre-existing condition"));
    }

    #[test]
    fn generic_rejection_quotes_the_reason() {
        let r = record(Some(60), "cataract surgery", 12);
        let mut result = decide(&r);
        // force a reason that matches no sub-template
        result.justification[0].match_reason = "excluded under rider 7".to_string();
        let text = render(&r, &result);
        assert!(text.contains("Reason: excluded under rider 7"));
    }

    #[test]
    fn conditional_narrative_appends_review_line_and_reason() {
        let r = record(Some(85), "hip replacement", 12);
        let result = decide(&r);
        let text = render(&r, &result);
        assert!(text.contains("Conditional approval"));
        assert!(text.contains("Subject to medical review"));
        assert!(text.contains("Advanced age requires additional review"));
        assert!(text.contains("**Next steps:** Please submit additional"));
    }

    #[test]
    fn low_confidence_adds_support_hint() {
        let r = record(Some(45), "knee surgery", 6);
        let mut result = decide(&r);
        result.confidence = 0.5;
        let text = render(&r, &result);
        assert!(text.contains("contact customer service for final confirmation"));

        result.confidence = 0.8;
        let text = render(&r, &result);
        assert!(!text.contains("final confirmation"));
    }

    #[test]
    fn render_is_deterministic() {
        let r = record(Some(45), "knee surgery", 6);
        let result = decide(&r);
        assert_eq!(render(&r, &result), render(&r, &result));
    }
}
