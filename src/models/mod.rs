//! Core data model for the claim decision pipeline
//!
//! Everything here is serde-derived: `DecisionResult` is the JSON shape the
//! host (HTTP layer, CLI) serializes back to the caller.

use serde::{Deserialize, Serialize};

/// Gender as extracted from the claim query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    /// Parse a free-form gender string, defaulting to `Other`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "male" => Gender::Male,
            "female" => Gender::Female,
            _ => Gender::Other,
        }
    }
}

/// Canonical structured representation of a user's claim scenario.
///
/// Every field is populated after extraction: deterministic rule values stand
/// in wherever the generative enrichment is missing or unusable, so the record
/// is never partially populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRecord {
    pub age: Option<u32>,
    pub gender: Gender,
    pub procedure: String,
    pub location: String,
    pub policy_duration_months: u32,
}

impl Default for QueryRecord {
    fn default() -> Self {
        Self {
            age: None,
            gender: Gender::Other,
            procedure: "unknown procedure".to_string(),
            location: "unknown".to_string(),
            policy_duration_months: 0,
        }
    }
}

/// One explanatory reason behind a decision, ordered by priority: the first
/// entry in a `DecisionResult` justification is the primary reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JustificationEntry {
    pub clause: String,
    pub match_reason: String,
    pub relevance_score: f32,
}

/// Verdict categories. `Error` is reserved for retrieval failure or an
/// unclassified fault at the orchestrator boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected,
    Conditional,
    Error,
}

/// Full verdict returned to the host for one claim query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionResult {
    pub decision: Decision,
    pub amount: Option<String>,
    pub confidence: f32,
    pub justification: Vec<JustificationEntry>,
    pub query_structured: QueryRecord,
    pub user_friendly_response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl DecisionResult {
    /// Error-shaped result: the only way a caller ever sees `decision=error`.
    pub fn error(
        error_message: impl Into<String>,
        user_friendly_response: impl Into<String>,
        query_structured: QueryRecord,
    ) -> Self {
        Self {
            decision: Decision::Error,
            amount: None,
            confidence: 0.0,
            justification: Vec::new(),
            query_structured,
            user_friendly_response: user_friendly_response.into(),
            error_message: Some(error_message.into()),
        }
    }
}

/// Policy clause returned by the retrieval collaborator. Read-only to the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedClause {
    pub text: String,
    pub clause_id: String,
    pub relevance_score: f32,
}
