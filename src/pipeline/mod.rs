//! Claim pipeline orchestrator
//!
//! Sequences one request end-to-end: extract the structured record, retrieve
//! supporting clauses, run the rule engine, attempt the (non-fatal)
//! generative secondary opinion, then render the narrative. Extraction and
//! decision are fallback-complete; the only error-shaped outcome the caller
//! ever sees comes from retrieval failure or an unclassified fault at this
//! boundary.

use std::sync::Arc;
use tracing::{info, warn};

use crate::decision::{decide, merge_generative_opinion};
use crate::error::{GenerativeError, RetrievalError};
use crate::extract::QueryExtractor;
use crate::llm::{generate_structured, GenerativeClient};
use crate::models::{DecisionResult, QueryRecord, RetrievedClause};
use crate::narrative;
use crate::repair::RepairEngine;
use crate::retrieval::ClauseRetriever;
use serde_json::Value;

/// Clauses requested per query.
const TOP_K: usize = 4;

/// Clause text is cut to this many characters in the opinion prompt.
const CLAUSE_SNIPPET_CHARS: usize = 400;

const RETRY_RESPONSE: &str =
    "Sorry, there was an error processing your request. Please try again.";

pub struct ClaimPipeline {
    extractor: QueryExtractor,
    llm: Arc<dyn GenerativeClient>,
    retriever: Arc<dyn ClauseRetriever>,
    repair: RepairEngine,
}

impl ClaimPipeline {
    pub fn new(llm: Arc<dyn GenerativeClient>, retriever: Arc<dyn ClauseRetriever>) -> Self {
        Self {
            extractor: QueryExtractor::new(Arc::clone(&llm)),
            llm,
            retriever,
            repair: RepairEngine::new(),
        }
    }

    /// Process one claim query. Infallible: every failure mode is normalized
    /// into the returned `DecisionResult`.
    pub async fn run(&self, user_query: &str) -> DecisionResult {
        let record = self.extractor.extract(user_query).await;
        info!(procedure = %record.procedure, duration = record.policy_duration_months, "parsed claim query");

        match self.run_with_record(&record).await {
            Ok(result) => result,
            Err(e) => {
                warn!("pipeline failed: {}", e);
                DecisionResult::error(e.to_string(), RETRY_RESPONSE, record)
            }
        }
    }

    async fn run_with_record(
        &self,
        record: &QueryRecord,
    ) -> Result<DecisionResult, RetrievalError> {
        let search_query = format!("{} coverage waiting period exclusion", record.procedure);
        let clauses = self.retriever.search(&search_query, TOP_K).await?;
        info!(clauses = clauses.len(), "retrieved policy clauses");

        let mut result = decide(record);

        match self.secondary_opinion(record, &clauses).await {
            Ok(opinion) => merge_generative_opinion(&mut result, &opinion),
            Err(e) => warn!("generative opinion unavailable, keeping rule-based result: {}", e),
        }

        result.user_friendly_response = narrative::render(record, &result);
        Ok(result)
    }

    /// Ask the generator to second-guess the verdict with a deliberately
    /// simple prompt. Failure here is never fatal.
    async fn secondary_opinion(
        &self,
        record: &QueryRecord,
        clauses: &[RetrievedClause],
    ) -> Result<Value, GenerativeError> {
        let prompt = build_opinion_prompt(record, clauses);
        generate_structured(self.llm.as_ref(), &self.repair, &prompt).await
    }
}

fn build_opinion_prompt(record: &QueryRecord, clauses: &[RetrievedClause]) -> String {
    let age = record
        .age
        .map(|a| a.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let clause_context = format_clause_context(clauses);

    format!(
        r#"Claim: {procedure} for {age} year old
Policy: {duration} months old

Relevant policy clauses:
{clause_context}

Decision (approved/rejected/conditional):
Confidence (0.0-1.0):
Reason:

JSON format:
{{"decision": "approved", "confidence": 0.8, "reason": "waiting period passed"}}"#,
        procedure = record.procedure,
        age = age,
        duration = record.policy_duration_months,
        clause_context = clause_context,
    )
}

/// `[clause_id] first 400 chars...` per retrieved clause.
fn format_clause_context(clauses: &[RetrievedClause]) -> String {
    clauses
        .iter()
        .map(|c| {
            let snippet: String = c.text.chars().take(CLAUSE_SNIPPET_CHARS).collect();
            format!("[{}] {}...", c.clause_id, snippet)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
