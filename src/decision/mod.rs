//! Deterministic rule-based decision engine
//!
//! System of record for the verdict: a pure, total function over the
//! structured query record. Rules are evaluated in a fixed order and the
//! first match wins. The generative secondary opinion may later refine the
//! justification and confidence, never the decision or amount.

use serde_json::Value;
use tracing::debug;

use crate::models::{Decision, DecisionResult, JustificationEntry, QueryRecord};

/// Procedures carrying the 24-month specified-disease waiting period.
const SPECIFIED_DISEASES: &[&str] = &["cataract", "hernia", "kidney stone", "gallbladder"];

/// Minimum policy age (months) for the specified-disease list.
const SPECIFIED_DISEASE_WAITING_MONTHS: u32 = 24;

/// Age above which claims go to medical review.
const MEDICAL_REVIEW_AGE: u32 = 80;

/// Decide a claim. Pure, deterministic, no I/O; never an error decision.
pub fn decide(record: &QueryRecord) -> DecisionResult {
    let procedure = record.procedure.to_lowercase();
    let duration = record.policy_duration_months;

    // Rule 1: initial 30-day waiting period.
    if duration < 1 {
        return verdict(
            record,
            Decision::Rejected,
            None,
            0.9,
            "Code-Excl03",
            "30-day waiting period has not passed",
            0.95,
        );
    }

    // Rule 2: pre-existing condition exclusion.
    if procedure.contains("pre-existing") || procedure.contains("chronic") {
        return verdict(
            record,
            Decision::Rejected,
            None,
            0.85,
            "Code-Excl01",
            "Pre-existing condition exclusion applies",
            0.9,
        );
    }

    // Rule 3: advanced age goes to medical review.
    if record.age.map_or(false, |age| age > MEDICAL_REVIEW_AGE) {
        return verdict(
            record,
            Decision::Conditional,
            Some("Subject to medical review"),
            0.7,
            "Age-Related",
            "Advanced age requires additional review",
            0.8,
        );
    }

    // Rule 4: specified-disease 24-month waiting period.
    if SPECIFIED_DISEASES.iter().any(|d| procedure.contains(d))
        && duration < SPECIFIED_DISEASE_WAITING_MONTHS
    {
        return verdict(
            record,
            Decision::Rejected,
            None,
            0.8,
            "Code-Excl02",
            "Specified diseases require 24-month waiting period",
            0.85,
        );
    }

    // Default: standard coverage.
    verdict(
        record,
        Decision::Approved,
        Some("Up to Sum Insured"),
        0.8,
        "Standard Coverage",
        &format!(
            "Waiting period passed ({} months), standard procedure coverage applies",
            duration
        ),
        0.85,
    )
}

fn verdict(
    record: &QueryRecord,
    decision: Decision,
    amount: Option<&str>,
    confidence: f32,
    clause: &str,
    match_reason: &str,
    relevance_score: f32,
) -> DecisionResult {
    DecisionResult {
        decision,
        amount: amount.map(str::to_string),
        confidence,
        justification: vec![JustificationEntry {
            clause: clause.to_string(),
            match_reason: match_reason.to_string(),
            relevance_score,
        }],
        query_structured: record.clone(),
        user_friendly_response: String::new(),
        error_message: None,
    }
}

/// Merge a generative secondary opinion into a rule-based result.
///
/// Non-destructive by contract: only `justification` and `confidence` may be
/// overwritten, and only when the opinion carries no error marker. Decision
/// and amount always stand.
pub fn merge_generative_opinion(result: &mut DecisionResult, opinion: &Value) {
    if opinion.get("error").is_some() {
        debug!("generative opinion carried an error marker, ignoring");
        return;
    }

    let confidence = opinion
        .get("confidence")
        .and_then(Value::as_f64)
        .map(|c| (c as f32).clamp(0.0, 1.0));

    if let Some(reason) = opinion.get("reason").and_then(Value::as_str) {
        if !reason.trim().is_empty() {
            result.justification = vec![JustificationEntry {
                clause: "LLM Analysis".to_string(),
                match_reason: reason.trim().to_string(),
                relevance_score: confidence.unwrap_or(0.7),
            }];
        }
    }

    if let Some(confidence) = confidence {
        result.confidence = confidence;
    }
}
