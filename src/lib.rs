//! ClaimLens - Insurance Claim Decision Pipeline
//!
//! This crate answers natural-language insurance-claim questions by combining
//! retrieved policy clauses with a deterministic rule engine, producing a
//! structured verdict plus a human-readable explanation.
//!
//! The generative collaborator is treated as adversarially unreliable: its
//! output goes through a multi-pass text repair engine, deterministic pattern
//! extraction is the ground truth for the structured record, and the rule
//! engine alone decides the verdict. Every call returns a schema-valid
//! `DecisionResult`, no matter how the generator misbehaves.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use claimlens::{ClaimPipeline, KeywordRetriever, OllamaClient};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let llm = Arc::new(OllamaClient::from_env()?);
//! let retriever = Arc::new(KeywordRetriever::from_json_file("data/parsed_output.json")?);
//! let pipeline = ClaimPipeline::new(llm, retriever);
//!
//! let result = pipeline.run("46-year-old male, knee surgery in Pune, 3-month policy").await;
//! println!("{}", serde_json::to_string_pretty(&result)?);
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

// Data model shared across the pipeline
pub mod models;

// Text repair engine for near-JSON generative output
pub mod repair;

// Structured query extraction (deterministic rules + generative enrichment)
pub mod extract;

// Deterministic rule-based decision engine
pub mod decision;

// User-facing explanation rendering
pub mod narrative;

// Collaborator seams: generative text and clause retrieval
pub mod llm;
pub mod retrieval;

// End-to-end orchestration
pub mod pipeline;

// Public re-exports for the host surface
pub use decision::{decide, merge_generative_opinion};
pub use error::{GenerativeError, RepairError, RetrievalError};
pub use extract::QueryExtractor;
pub use llm::{GenerationOptions, GenerativeClient, OllamaClient};
pub use models::{
    Decision, DecisionResult, Gender, JustificationEntry, QueryRecord, RetrievedClause,
};
pub use narrative::render;
pub use pipeline::ClaimPipeline;
pub use repair::RepairEngine;
pub use retrieval::{ClauseRetriever, KeywordRetriever, PolicyClause};
