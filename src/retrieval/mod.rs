//! Clause retrieval collaborator
//!
//! The core only consumes retrieval results; index building and embedding
//! search live outside it. `ClauseRetriever` is the seam, and
//! `KeywordRetriever` is a small in-memory lexical implementation used by the
//! CLI and tests where a vector index would be overkill.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;

use crate::error::RetrievalError;
use crate::models::RetrievedClause;

/// External retrieval service: top-k clauses for a query string.
#[async_trait]
pub trait ClauseRetriever: Send + Sync {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedClause>, RetrievalError>;
}

/// One clause of the parsed policy document, as produced by the (external)
/// document processor.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyClause {
    pub clause_id: String,
    pub text: String,
}

/// In-memory term-overlap retriever over a parsed clause list.
///
/// Relevance is the fraction of query terms present in the clause text;
/// clauses with no overlap are dropped. An empty clause list behaves like an
/// unbuilt index.
#[derive(Debug)]
pub struct KeywordRetriever {
    clauses: Vec<PolicyClause>,
}

impl KeywordRetriever {
    pub fn new(clauses: Vec<PolicyClause>) -> Self {
        Self { clauses }
    }

    /// Load the clause list the document processor writes as JSON
    /// (`[{"clause_id": ..., "text": ...}, ...]`).
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RetrievalError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|_| RetrievalError::IndexNotReady)?;
        let clauses: Vec<PolicyClause> = serde_json::from_str(&raw)
            .map_err(|e| RetrievalError::Backend(format!("invalid clause list {:?}: {}", path, e)))?;
        Ok(Self::new(clauses))
    }
}

#[async_trait]
impl ClauseRetriever for KeywordRetriever {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedClause>, RetrievalError> {
        if self.clauses.is_empty() {
            return Err(RetrievalError::IndexNotReady);
        }

        let terms: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<RetrievedClause> = self
            .clauses
            .iter()
            .filter_map(|clause| {
                let text_lower = clause.text.to_lowercase();
                let hits = terms
                    .iter()
                    .filter(|t| text_lower.contains(t.as_str()))
                    .count();
                if hits == 0 {
                    return None;
                }
                Some(RetrievedClause {
                    text: clause.text.clone(),
                    clause_id: clause.clause_id.clone(),
                    relevance_score: hits as f32 / terms.len() as f32,
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.relevance_score
                .partial_cmp(&a.relevance_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        Ok(scored)
    }
}
